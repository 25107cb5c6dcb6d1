use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize a column which Istanbul may emit as `null` (e.g. remapped
/// locations without an end column).
fn nullable_column<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    #[serde(default, deserialize_with = "nullable_column")]
    pub column: u32,
}

#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Location,
    pub end: Location,
}

impl Range {
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Range {
        Range {
            start: Location {
                line: start_line,
                column: start_column,
            },
            end: Location {
                line: end_line,
                column: end_column,
            },
        }
    }

    /// Range covering a single line, used when only line numbers are known.
    pub fn line(line: u32) -> Range {
        Range::new(line, 0, line, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_accept_null_column() {
        let range: Range = serde_json::from_str(
            r#"{"start":{"line":3,"column":4},"end":{"line":5,"column":null}}"#,
        )
        .unwrap();

        assert_eq!(range, Range::new(3, 4, 5, 0));
    }
}
