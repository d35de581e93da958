use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result, anyhow};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{CellAlignment, ContentArrangement, Table};
use dbf::{DbfMetadata, DbfReader, DbfReaderOptions, DbfRecord, DbfValue, LengthKind};
use serde_json::{Map, Value, json};
use tracing::{debug, info, info_span, warn};

use crate::cli::{DumpArgs, DumpFormatArg, TableArgs};

pub fn run_info(args: &TableArgs) -> Result<()> {
    let span = info_span!("info", path = %args.path.display());
    let _guard = span.enter();
    let reader = open_table(args)?;
    let metadata = reader.metadata()?;
    println!("{}", header_table(metadata));
    println!("{}", field_table(metadata));
    for line in mismatch_lines(metadata) {
        println!("{line}");
    }
    if let Some(line) = memo_hint(metadata, args.memo.is_some()) {
        println!("{line}");
    }
    Ok(())
}

pub fn run_dump(args: &DumpArgs) -> Result<()> {
    let span = info_span!("dump", path = %args.table.path.display());
    let _guard = span.enter();
    let mut reader = open_table(&args.table)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    let mut written = 0usize;
    let mut skipped = 0usize;
    for record in reader.records() {
        if args.limit.is_some_and(|limit| written >= limit) {
            break;
        }
        let record = record.context("read record")?;
        if args.skip_deleted && record.is_deleted() {
            skipped += 1;
            continue;
        }
        let line = match args.format {
            DumpFormatArg::Text => record_line(&record)?,
            DumpFormatArg::Json => serde_json::to_string(&record_json(&record)?)?,
        };
        writeln!(out, "{line}")?;
        written += 1;
    }
    out.flush()?;
    info!(written, skipped, "dump complete");
    Ok(())
}

fn open_table(args: &TableArgs) -> Result<DbfReader<File>> {
    let options = reader_options(args.encoding.as_deref())?;
    debug!(memo = ?args.memo, encoding = ?args.encoding, "opening table");
    DbfReader::open_with_options(&args.path, args.memo.as_deref(), options)
        .with_context(|| format!("open {}", args.path.display()))
}

fn reader_options(encoding: Option<&str>) -> Result<DbfReaderOptions> {
    let options = DbfReaderOptions::new();
    let Some(label) = encoding else {
        return Ok(options);
    };
    let encoding = DbfReaderOptions::encoding_for_label(label)
        .ok_or_else(|| anyhow!("unknown encoding label {label:?}"))?;
    Ok(options.with_override_encoding(encoding))
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn header_table(metadata: &DbfMetadata) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Property", "Value"]);
    apply_table_style(&mut table);
    let update_date = metadata
        .update_date
        .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string());
    table.add_row(vec!["Type".to_string(), metadata.file_type.to_string()]);
    table.add_row(vec!["Updated".to_string(), update_date]);
    table.add_row(vec!["Records".to_string(), metadata.record_count.to_string()]);
    table.add_row(vec![
        "Header length".to_string(),
        metadata.header_length.to_string(),
    ]);
    table.add_row(vec![
        "Record length".to_string(),
        metadata.record_length.to_string(),
    ]);
    table.add_row(vec![
        "Code page".to_string(),
        format!(
            "0x{:02X} ({})",
            metadata.language_driver,
            metadata.encoding.name()
        ),
    ]);
    table.add_row(vec![
        "Incomplete transaction".to_string(),
        metadata.incomplete_transaction.to_string(),
    ]);
    table.add_row(vec![
        "Encrypted".to_string(),
        metadata.encryption_flag.to_string(),
    ]);
    table
}

fn field_table(metadata: &DbfMetadata) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Name", "Type", "Length", "Decimals", "Offset"]);
    apply_table_style(&mut table);
    for (index, field) in metadata.fields().iter().enumerate() {
        table.add_row(vec![
            (index + 1).to_string(),
            field.name.clone(),
            format!("{} ({})", field.field_type.name(), field.field_type.to_char()),
            field.length.to_string(),
            field.decimal_count.to_string(),
            field.offset().to_string(),
        ]);
    }
    for column in [0, 3, 4, 5] {
        if let Some(column) = table.column_mut(column) {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }
    table
}

fn mismatch_lines(metadata: &DbfMetadata) -> Vec<String> {
    metadata
        .length_mismatches()
        .iter()
        .map(|mismatch| {
            let what = match mismatch.kind {
                LengthKind::Header => "header length",
                LengthKind::Record => "record length",
            };
            warn!(
                declared = mismatch.declared,
                computed = mismatch.computed,
                "{what} disagrees with field table"
            );
            format!(
                "warning: declared {what} {} differs from computed {}",
                mismatch.declared, mismatch.computed
            )
        })
        .collect()
}

/// Note for a memo dialect opened without its memo store.
fn memo_hint(metadata: &DbfMetadata, memo_attached: bool) -> Option<String> {
    if memo_attached || !metadata.file_type.has_memo() {
        return None;
    }
    warn!(file_type = %metadata.file_type, "memo table opened without a memo store");
    Some(format!(
        "warning: {} tables keep memo text in a separate file; pass --memo to read it",
        metadata.file_type
    ))
}

/// One text line: record number, deletion marker, then `NAME=value` pairs.
fn record_line(record: &DbfRecord) -> Result<String> {
    let text = record
        .to_ordered_text()
        .with_context(|| format!("decode record {}", record.record_number()))?;
    let marker = if record.is_deleted() { '*' } else { ' ' };
    Ok(format!(
        "{:>6}{marker} {}",
        record.record_number(),
        text.trim_end_matches(", ")
    ))
}

fn record_json(record: &DbfRecord) -> Result<Value> {
    let mut object = Map::new();
    object.insert("_record".to_string(), json!(record.record_number()));
    object.insert("_deleted".to_string(), json!(record.is_deleted()));
    for field in record.fields() {
        let value = record
            .value(&field.name)
            .with_context(|| format!("decode {} in record {}", field.name, record.record_number()))?;
        object.insert(field.name.clone(), value_json(&value));
    }
    Ok(Value::Object(object))
}

fn value_json(value: &DbfValue) -> Value {
    match value {
        DbfValue::Null => Value::Null,
        DbfValue::String(s) | DbfValue::Memo(s) => json!(s),
        DbfValue::Date(d) => json!(d.format("%Y-%m-%d").to_string()),
        DbfValue::DateTime(dt) => json!(dt.to_rfc3339()),
        // exact text, not a float
        DbfValue::Decimal(d) => json!(d.to_string()),
        DbfValue::Boolean(b) => json!(b),
        DbfValue::Integer(i) => json!(i),
        DbfValue::Double(x) => serde_json::Number::from_f64(*x).map_or(Value::Null, Value::Number),
        DbfValue::Bytes(_) => json!(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use dbf::{DbfField, DbfFileType, Decimal, TextEncoding};
    use std::sync::Arc;

    fn sample() -> (Arc<DbfMetadata>, Vec<DbfRecord>) {
        let metadata = Arc::new(
            DbfMetadata::from_fields(
                vec![
                    DbfField::character("NAME", 8),
                    DbfField::numeric("PRICE", 7, 2),
                    DbfField::date("SOLD"),
                    DbfField::logical("PAID"),
                ],
                DbfFileType::DBase4,
            )
            .unwrap(),
        );
        let mut first = DbfRecord::blank(Arc::clone(&metadata));
        first.set_string("NAME", Some("lamp")).unwrap();
        first
            .set_decimal("PRICE", Some(Decimal::new(1999, 2)))
            .unwrap();
        first
            .set_date("SOLD", NaiveDate::from_ymd_opt(2022, 3, 14))
            .unwrap();
        first.set_boolean("PAID", Some(true)).unwrap();
        let mut second = DbfRecord::blank(Arc::clone(&metadata));
        second.set_string("NAME", Some("desk")).unwrap();
        second.set_deleted(true);
        (metadata, vec![first, second])
    }

    fn reread() -> Vec<DbfRecord> {
        let (metadata, records) = sample();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.dbf");
        dbf::write_dbf(&path, &metadata, &records).unwrap();
        let (_, records) = dbf::read_dbf(&path).unwrap();
        records
    }

    #[test]
    fn test_record_line() {
        let records = reread();
        assert_eq!(
            record_line(&records[0]).unwrap(),
            "     1  NAME=lamp, PRICE=19.99, SOLD=20220314, PAID=true"
        );
        assert_eq!(
            record_line(&records[1]).unwrap(),
            "     2* NAME=desk, PRICE=null, SOLD=null, PAID=null"
        );
    }

    #[test]
    fn test_record_json() {
        let records = reread();
        insta::assert_json_snapshot!(record_json(&records[0]).unwrap(), @r#"
        {
          "NAME": "lamp",
          "PAID": true,
          "PRICE": "19.99",
          "SOLD": "2022-03-14",
          "_deleted": false,
          "_record": 1
        }
        "#);
        assert_eq!(record_json(&records[1]).unwrap()["PRICE"], Value::Null);
    }

    #[test]
    fn test_reader_options_label() {
        let options = reader_options(Some("cp1251")).unwrap();
        assert_eq!(
            options.override_encoding.as_ref().map(TextEncoding::name),
            Some("windows-1251")
        );
        let options = reader_options(Some("cp437")).unwrap();
        assert_eq!(
            options.override_encoding.as_ref().map(TextEncoding::name),
            Some("IBM437")
        );
        assert!(reader_options(None).unwrap().override_encoding.is_none());
        assert!(reader_options(Some("no-such-charset")).is_err());
    }

    #[test]
    fn test_memo_hint() {
        let plain = DbfMetadata::from_fields_string("NAME,C,4,0").unwrap();
        assert_eq!(memo_hint(&plain, false), None);
        let memo_table = DbfMetadata::from_fields(
            vec![DbfField::character("NAME", 4)],
            DbfFileType::FoxBasePlusMemo,
        )
        .unwrap();
        let hint = memo_hint(&memo_table, false).unwrap();
        assert!(hint.contains("--memo"), "{hint}");
        assert_eq!(memo_hint(&memo_table, true), None);
    }

    #[test]
    fn test_field_table_rows() {
        let (metadata, _) = sample();
        let table = field_table(&metadata);
        assert_eq!(table.row_count(), 4);
        let rendered = table.to_string();
        assert!(rendered.contains("Numeric (N)"));
        assert!(mismatch_lines(&metadata).is_empty());
    }
}
