// Parsing of one named report part into key/value pairs and a table

use serde::Serialize;

/// Fixed-width table found in a report part
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportTable {
    /// Header lines between the two dashed rules, trimmed
    pub header: Vec<String>,
    /// Whitespace-separated cells of each data row
    pub rows: Vec<Vec<String>>,
}

/// Structured content of one report part
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportPart {
    key_values: Vec<(String, String)>,
    table: Option<ReportTable>,
}

impl ReportPart {
    /// Parse the body of a part (the lines below its starred heading)
    ///
    /// Dotted-leader lines before the first dashed rule become key/value
    /// pairs; the rows following the rules become the table.
    pub fn parse(text: &str) -> Self {
        let lines: Vec<&str> = text.lines().collect();
        let first_rule = lines.iter().position(|line| is_rule(line));

        let preamble = &lines[..first_rule.unwrap_or(lines.len())];
        let key_values = preamble
            .iter()
            .filter_map(|line| split_leader(line))
            .collect();

        let table = first_rule.map(|first| {
            let after_first = &lines[first + 1..];
            let (header, body) = match after_first.iter().position(|line| is_rule(line)) {
                Some(second) => (&after_first[..second], &after_first[second + 1..]),
                None => (&after_first[..0], after_first),
            };
            ReportTable {
                header: header
                    .iter()
                    .map(|line| line.trim().to_string())
                    .filter(|line| !line.is_empty())
                    .collect(),
                rows: body
                    .iter()
                    .take_while(|line| !line.trim().is_empty() && !is_rule(line))
                    .map(|line| line.split_whitespace().map(str::to_string).collect())
                    .collect(),
            }
        });

        Self { key_values, table }
    }

    pub fn key_values(&self) -> &[(String, String)] {
        &self.key_values
    }

    /// Value of the first dotted-leader entry named `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.key_values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn table(&self) -> Option<&ReportTable> {
        self.table.as_ref()
    }
}

fn is_rule(line: &str) -> bool {
    let line = line.trim();
    line.len() >= 3 && line.chars().all(|c| c == '-')
}

/// Split `Name ......... value` into its name and value
fn split_leader(line: &str) -> Option<(String, String)> {
    let idx = line.find("..")?;
    let key = line[..idx].trim();
    if key.is_empty() {
        return None;
    }
    let value = line[idx..].trim_start_matches('.').trim();
    Some((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    const OPTIONS: &str = "  Flow Units ............... CMS
  Process Models:
    Rainfall/Runoff ........ YES
  Starting Date ............ 01/01/2024 00:00:00
";

    const NODE_DEPTH: &str = "
  ---------------------------------------------------------------
                                 Average  Maximum  Maximum
                                   Depth    Depth      HGL
  Node                 Type         Meters   Meters   Meters
  ---------------------------------------------------------------
  J1                   JUNCTION       0.01     0.24    10.24
  OUT1                 OUTFALL        0.00     0.00     9.00

";

    #[test]
    fn test_part__dotted_leaders__then_key_values() {
        let part = ReportPart::parse(OPTIONS);
        assert_eq!(part.key_values().len(), 3);
        assert_eq!(part.get("Flow Units"), Some("CMS"));
        assert_eq!(part.get("Rainfall/Runoff"), Some("YES"));
        assert_eq!(part.get("Starting Date"), Some("01/01/2024 00:00:00"));
        assert!(part.table().is_none());
    }

    #[test]
    fn test_part__ruled_table__then_header_and_rows() {
        let part = ReportPart::parse(NODE_DEPTH);
        let table = part.table().unwrap();
        assert_eq!(table.header.len(), 3);
        assert!(table.header[2].starts_with("Node"));
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["OUT1", "OUTFALL", "0.00", "0.00", "9.00"]);
        assert!(part.key_values().is_empty());
    }

    #[test]
    fn test_part__single_rule__then_rows_without_header() {
        let part = ReportPart::parse("  ----------\n  a 1\n  b 2\n");
        let table = part.table().unwrap();
        assert!(table.header.is_empty());
        assert_eq!(table.rows, vec![vec!["a", "1"], vec!["b", "2"]]);
    }
}
