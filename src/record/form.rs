//! Parsing and validation of the multipart record form.

use axum::extract::{Multipart, multipart::Field};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    record::{
        core::{Record, RecordBuilder, RecordType},
        service::AttachmentUpload,
    },
};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// The decoded contents of a record form submission.
#[derive(Debug, PartialEq)]
pub struct RecordForm {
    /// The record fields to persist.
    pub fields: RecordBuilder,
    /// The uploaded image, if one was attached.
    pub attachment: Option<AttachmentUpload>,
    /// Whether the client asked to remove the existing attachment.
    pub clear_attachment: bool,
}

/// Read and validate the multipart `form` for creating or updating a record.
///
/// Required fields are `date`, `type`, `category` and `amount`; `notes`,
/// `image` and `clearImage` are optional. Validation happens here, before
/// any store is touched. Empty text fields are treated as absent.
///
/// # Errors
/// This function will return a:
/// - [Error::MultipartError] if the form itself cannot be read,
/// - [Error::MissingField] if a required field is absent or empty,
/// - or [Error::InvalidDate], [Error::InvalidAmount] or
///   [Error::InvalidRecordType] if a field fails to parse.
pub async fn parse_record_form(mut form: Multipart) -> Result<RecordForm, Error> {
    let mut date = None;
    let mut kind = None;
    let mut category = None;
    let mut amount = None;
    let mut notes = None;
    let mut attachment = None;
    let mut clear_attachment = false;

    while let Some(field) = form
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_owned();

        match name.as_str() {
            "date" => {
                let text = text_field(field).await?;
                if !text.is_empty() {
                    date = Some(parse_date(&text)?);
                }
            }
            "type" => {
                let text = text_field(field).await?;
                if !text.is_empty() {
                    kind = Some(text.parse::<RecordType>()?);
                }
            }
            "category" => {
                let text = text_field(field).await?;
                if !text.is_empty() {
                    category = Some(text);
                }
            }
            "amount" => {
                let text = text_field(field).await?;
                if !text.is_empty() {
                    amount = Some(parse_amount(&text)?);
                }
            }
            "notes" => {
                let text = text_field(field).await?;
                if !text.is_empty() {
                    notes = Some(text);
                }
            }
            "image" => attachment = file_field(field).await?,
            "clearImage" => clear_attachment = text_field(field).await? == "true",
            _ => {}
        }
    }

    let date = date.ok_or(Error::MissingField("date"))?;
    let kind = kind.ok_or(Error::MissingField("type"))?;
    let category = category.ok_or(Error::MissingField("category"))?;
    let amount = amount.ok_or(Error::MissingField("amount"))?;

    Ok(RecordForm {
        fields: Record::build(date, kind, &category, amount).notes(notes),
        attachment,
        clear_attachment,
    })
}

/// Parse a `YYYY-MM-DD` date string.
pub(crate) fn parse_date(text: &str) -> Result<Date, Error> {
    Date::parse(text, DATE_FORMAT).map_err(|_| Error::InvalidDate(text.to_owned()))
}

fn parse_amount(text: &str) -> Result<f64, Error> {
    let amount: f64 = text
        .parse()
        .map_err(|_| Error::InvalidAmount(text.to_owned()))?;

    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount(text.to_owned()));
    }

    Ok(amount)
}

async fn text_field(field: Field<'_>) -> Result<String, Error> {
    field
        .text()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))
}

async fn file_field(field: Field<'_>) -> Result<Option<AttachmentUpload>, Error> {
    let file_name = field.file_name().unwrap_or_default().to_owned();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_owned();
    let bytes = field
        .bytes()
        .await
        .map_err(|error| Error::MultipartError(error.to_string()))?;

    // Browsers submit an empty file part when no file was chosen.
    if file_name.is_empty() && bytes.is_empty() {
        return Ok(None);
    }

    Ok(Some(AttachmentUpload {
        file_name,
        content_type,
        bytes: bytes.to_vec(),
    }))
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::Error;

    use super::{parse_amount, parse_date};

    #[test]
    fn parse_date_accepts_iso_dates() {
        assert_eq!(parse_date("2024-01-05"), Ok(date!(2024 - 01 - 05)));
    }

    #[test]
    fn parse_date_rejects_other_formats() {
        for text in ["05/01/2024", "2024-13-01", "yesterday", "2024-01-05T00:00:00Z"] {
            let result = parse_date(text);

            assert_eq!(result, Err(Error::InvalidDate(text.to_owned())));
        }
    }

    #[test]
    fn parse_amount_accepts_non_negative_numbers() {
        assert_eq!(parse_amount("1000"), Ok(1000.0));
        assert_eq!(parse_amount("0"), Ok(0.0));
        assert_eq!(parse_amount("12.5"), Ok(12.5));
    }

    #[test]
    fn parse_amount_rejects_negative_and_non_numeric_input() {
        for text in ["-1", "NaN", "inf", "one thousand", "1,000"] {
            let result = parse_amount(text);

            assert_eq!(result, Err(Error::InvalidAmount(text.to_owned())));
        }
    }
}
