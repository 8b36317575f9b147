//! CSV rendering of extracted records.
//!
//! Column order follows the Record field order. Output is a UTF-8 string;
//! quoting only where the comma/quote/newline conventions demand it.

use crate::models::Record;

const HEADER: &[&str] = &["title", "price", "description", "category", "raw_text"];

pub fn records_to_csv(records: &[Record]) -> String {
    let mut out = String::new();
    push_row(&mut out, HEADER);
    for record in records {
        push_row(
            &mut out,
            &[
                &record.title,
                &record.price,
                record.description.as_deref().unwrap_or(""),
                &record.category,
                record.raw_text.as_deref().unwrap_or(""),
            ],
        );
    }
    out
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

fn push_row(out: &mut String, row: &[&str]) {
    let mut first = true;
    for cell in row {
        if !first {
            out.push(',');
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNKNOWN_CATEGORY;

    fn record(title: &str, price: &str) -> Record {
        Record {
            title: title.to_string(),
            price: price.to_string(),
            description: None,
            category: UNKNOWN_CATEGORY.to_string(),
            raw_text: Some(format!("{} | {}", title, price)),
        }
    }

    #[test]
    fn header_matches_record_field_order() {
        let csv = records_to_csv(&[]);
        assert_eq!(csv, "title,price,description,category,raw_text\n");
    }

    #[test]
    fn plain_fields_stay_unquoted() {
        let csv = records_to_csv(&[record("Tacos Poulet", "30 MAD")]);
        let mut lines = csv.lines();
        lines.next();
        assert_eq!(
            lines.next(),
            Some("Tacos Poulet,30 MAD,,unknown,Tacos Poulet | 30 MAD")
        );
    }

    #[test]
    fn commas_and_quotes_are_escaped() {
        let mut r = record("Pizza \"Napoli\", large", "45 MAD");
        r.raw_text = None;
        let csv = records_to_csv(&[r]);
        let mut lines = csv.lines();
        lines.next();
        assert_eq!(
            lines.next(),
            Some("\"Pizza \"\"Napoli\"\", large\",45 MAD,,unknown,")
        );
    }
}
