use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints `rows` as pretty JSON, or as a tab separated table when `table` is set.
pub fn print_rows<T: Serialize>(rows: &[T], table: bool) -> Result<()> {
    if table {
        print!("{}", render_table(rows)?);
        Ok(())
    } else {
        print_json(rows)
    }
}

/// Header line plus one line per row. Columns are the union of row keys in
/// first-seen order; missing cells are empty.
pub fn render_table<T: Serialize>(rows: &[T]) -> Result<String> {
    let values: Vec<Value> = rows
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()?;

    let mut columns: Vec<String> = Vec::new();
    for v in &values {
        if let Value::Object(map) = v {
            for key in map.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
    }

    let mut out = columns.join("\t");
    out.push('\n');
    for v in &values {
        let cells: Vec<String> = columns.iter().map(|c| cell(v.get(c))).collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
    Ok(out)
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
