//! Country-aware postal address layout.
//!
//! Layouts use the field codes of the Unicode CLDR / libaddressinput address
//! data: `%A` street, `%C` city, `%S` region, `%Z` postal code and `%n` for a
//! line break. Literal text between fields is only kept when the fields on
//! both sides of it are present.

pub const LINE_BREAK: &str = "<br/>";

const DEFAULT_LAYOUT: &str = "%A%n%C %S %Z";

const LAYOUTS: &[(&str, &str)] = &[
    ("AR", "%A%n%Z %C%n%S"),
    ("AT", "%A%n%Z %C"),
    ("AU", "%A%n%C %S %Z"),
    ("BE", "%A%n%Z %C"),
    ("BR", "%A%n%C-%S%n%Z"),
    ("CA", "%A%n%C %S %Z"),
    ("CH", "%A%n%Z %C"),
    ("CN", "%Z%n%S%C%n%A"),
    ("CZ", "%A%n%Z %C"),
    ("DE", "%A%n%Z %C"),
    ("DK", "%A%n%Z %C"),
    ("ES", "%A%n%Z %C %S"),
    ("FI", "%A%n%Z %C"),
    ("FR", "%A%n%Z %C"),
    ("GB", "%A%n%C%n%Z"),
    ("GR", "%A%n%Z %C"),
    ("IE", "%A%n%C%n%S%n%Z"),
    ("IN", "%A%n%C %Z%n%S"),
    ("IT", "%A%n%Z %C %S"),
    ("JP", "%Z%n%S%C%n%A"),
    ("KR", "%S %C%n%A%n%Z"),
    ("MX", "%A%n%Z %C, %S"),
    ("NL", "%A%n%Z %C"),
    ("NO", "%A%n%Z %C"),
    ("NZ", "%A%n%C %Z"),
    ("PL", "%A%n%Z %C"),
    ("PT", "%A%n%Z %C"),
    ("RU", "%A%n%C%n%S%n%Z"),
    ("SE", "%A%n%Z %C"),
    ("SG", "%A%nSINGAPORE %Z"),
    ("TR", "%A%n%Z %C/%S"),
    ("US", "%A%n%C, %S %Z"),
    ("ZA", "%A%n%C%n%Z"),
];

/// Looks up the layout for an ISO 3166 alpha-2 country code.
pub fn layout_for(country_code: &str) -> &'static str {
    let code = country_code.trim().to_ascii_uppercase();
    LAYOUTS
        .binary_search_by(|(candidate, _)| (*candidate).cmp(code.as_str()))
        .map_or(DEFAULT_LAYOUT, |idx| LAYOUTS[idx].1)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Address<'a> {
    pub street: &'a str,
    pub city: &'a str,
    pub region: &'a str,
    pub postal_code: &'a str,
    pub country_code: &'a str,
}

#[derive(Debug, PartialEq, Eq)]
enum Piece<'f> {
    Field(char),
    Literal(&'f str),
}

impl<'a> Address<'a> {
    /// Address lines in the country's order. Empty lines are dropped.
    pub fn lines(&self) -> Vec<String> {
        layout_for(self.country_code)
            .split("%n")
            .flat_map(|line| self.render_line(line))
            .collect()
    }

    fn field(&self, code: char) -> &'a str {
        match code {
            'A' => self.street,
            'C' => self.city,
            'S' => self.region,
            'Z' => self.postal_code,
            _ => "",
        }
        .trim()
    }

    /// Renders one layout line. The street field may expand into several lines.
    fn render_line(&self, line: &str) -> Vec<String> {
        let pieces = parse_line(line);

        if pieces == [Piece::Field('A')] {
            return self
                .street
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(ToOwned::to_owned)
                .collect();
        }

        let mut out = String::new();
        let mut pending = String::new();
        let mut seen_field = false;
        let mut skip_literal = false;
        let mut last_was_present = false;

        for piece in pieces {
            match piece {
                Piece::Literal(text) => {
                    if skip_literal {
                        skip_literal = false;
                    } else {
                        pending.push_str(text);
                    }
                }
                Piece::Field(code) => {
                    let value = self.field(code);
                    if value.is_empty() {
                        if out.is_empty() {
                            pending.clear();
                        } else {
                            skip_literal = true;
                        }
                        last_was_present = false;
                    } else {
                        if !out.is_empty() || !seen_field {
                            out.push_str(&pending);
                        }
                        pending.clear();
                        out.push_str(value);
                        last_was_present = true;
                    }
                    seen_field = true;
                }
            }
        }

        if last_was_present {
            out.push_str(&pending);
        }

        let out = out.trim();
        if out.is_empty() {
            vec![]
        } else {
            vec![out.to_owned()]
        }
    }
}

fn parse_line(line: &str) -> Vec<Piece<'_>> {
    let mut pieces = vec![];
    let mut rest = line;
    while let Some(idx) = rest.find('%') {
        if idx > 0 {
            pieces.push(Piece::Literal(&rest[..idx]));
        }
        let mut chars = rest[idx + 1..].chars();
        match chars.next() {
            Some(code) => {
                pieces.push(Piece::Field(code));
                rest = chars.as_str();
            }
            None => {
                rest = "";
            }
        }
    }
    if !rest.is_empty() {
        pieces.push(Piece::Literal(rest));
    }
    pieces
}
