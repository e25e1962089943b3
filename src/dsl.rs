//! Rule-file parser.
//!
//! Rule format:
//! ```text
//! # normalise results
//! GROUP results
//! | FILTER OBX.3 = "RESULT"
//! | EDIT OBX.4 = "NEGATIVE"
//! ?
//! GROUP
//! | FILTER PID.1 = "1"
//! | EDIT PID.5.2 CLEAR
//! ?
//! ```
//!
//! - `GROUP [name]` opens a group
//! - `?` closes it; the next `GROUP` or end of input also closes it
//! - `| FILTER SEG.f[.c] = "value"` adds an exact-match filter
//! - `| EDIT SEG.f[.c] = "value"` sets the addressed value
//! - `| EDIT SEG.f[.c] CLEAR` empties it (`DELETE` is accepted too)
//! - The leading `|` is optional
//! - Lines starting with `#` are comments
//!
//! Values are delimited strings: the first non-blank character is the
//! delimiter and the value runs to its next occurrence, so `"a"`, `/a/` and
//! `.a.` all mean `a`. A delimited value is always written literally, even
//! when it reads `DELETE`.

use crate::address::parse_segment_address;
use crate::{EditAction, EditGroup, EditOperation, FieldAddress, FilterPredicate, RuleError};

/// One parsed rule line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// GROUP [name]
    Group { name: Option<String> },
    /// FILTER SEG.addr = "value"
    Filter(FilterPredicate),
    /// EDIT SEG.addr = "value" | CLEAR
    Edit(EditOperation),
    /// ?
    End,
}

impl Command {
    /// Keyword for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Group { .. } => "GROUP",
            Command::Filter(_) => "FILTER",
            Command::Edit(_) => "EDIT",
            Command::End => "?",
        }
    }
}

/// Group under construction while parsing.
struct OpenGroup {
    line: usize,
    name: Option<String>,
    filters: Vec<FilterPredicate>,
    edits: Vec<EditOperation>,
}

impl OpenGroup {
    fn close(self) -> Result<EditGroup, RuleError> {
        let group = EditGroup::new(self.filters, self.edits)
            .map_err(|e| RuleError::parse(self.line, format!("GROUP: {e}")))?;
        Ok(match self.name {
            Some(name) => group.with_name(name),
            None => group,
        })
    }
}

/// Parse rule text into validated edit groups, in file order.
pub fn parse_rules(text: &str) -> Result<Vec<EditGroup>, RuleError> {
    let mut groups = Vec::new();
    let mut open: Option<OpenGroup> = None;

    for (line_num, cmd) in parse_commands(text)? {
        let keyword = cmd.name();
        match cmd {
            Command::Group { name } => {
                if let Some(group) = open.take() {
                    groups.push(group.close()?);
                }
                open = Some(OpenGroup {
                    line: line_num,
                    name,
                    filters: Vec::new(),
                    edits: Vec::new(),
                });
            }
            Command::End => match open.take() {
                Some(group) => groups.push(group.close()?),
                None => {
                    return Err(RuleError::parse(
                        line_num,
                        format!("'{keyword}' without an open GROUP"),
                    ));
                }
            },
            Command::Filter(filter) => match open.as_mut() {
                Some(group) => group.filters.push(filter),
                None => return Err(outside_group(line_num, keyword)),
            },
            Command::Edit(edit) => match open.as_mut() {
                Some(group) => group.edits.push(edit),
                None => return Err(outside_group(line_num, keyword)),
            },
        }
    }

    if let Some(group) = open.take() {
        groups.push(group.close()?);
    }

    Ok(groups)
}

/// Build one group from form-style `SEG.field[.component]=value` text, as
/// typed into command-line options.
///
/// Everything after the first `=` is the value, taken verbatim. An edit whose
/// value reads `DELETE` in any case clears the address.
pub fn parse_inline_group<F, E>(filters: &[F], edits: &[E]) -> Result<EditGroup, RuleError>
where
    F: AsRef<str>,
    E: AsRef<str>,
{
    let filters = filters
        .iter()
        .map(|text| {
            let (seg, addr, value) = split_assignment(text.as_ref())?;
            Ok(FilterPredicate::new(seg, addr, value))
        })
        .collect::<Result<Vec<_>, RuleError>>()?;
    let edits = edits
        .iter()
        .map(|text| {
            let (seg, addr, value) = split_assignment(text.as_ref())?;
            Ok(EditOperation::new(seg, addr, EditAction::from_input(value)))
        })
        .collect::<Result<Vec<_>, RuleError>>()?;
    EditGroup::new(filters, edits)
}

fn split_assignment(text: &str) -> Result<(String, FieldAddress, &str), RuleError> {
    let (addr, value) = text
        .split_once('=')
        .ok_or_else(|| RuleError::InvalidAssignment(text.to_string()))?;
    let (seg, addr) = parse_segment_address(addr)?;
    Ok((seg, addr, value))
}

fn outside_group(line: usize, keyword: &str) -> RuleError {
    RuleError::parse(line, format!("{keyword} outside of a GROUP"))
}

/// Parse rule text into commands paired with their 1-based line numbers.
pub fn parse_commands(text: &str) -> Result<Vec<(usize, Command)>, RuleError> {
    let mut commands = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let line_num = idx + 1;
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Continuation lines: "| COMMAND ..."
        let line = match line.strip_prefix('|') {
            Some(stripped) => stripped.trim(),
            None => line,
        };
        if line.is_empty() {
            continue;
        }

        let cmd = parse_command(line).map_err(|e| RuleError::parse(line_num, e))?;
        commands.push((line_num, cmd));
    }

    Ok(commands)
}

/// Parse a single command line.
fn parse_command(line: &str) -> Result<Command, String> {
    let (keyword, rest) = match line.split_once(char::is_whitespace) {
        Some((k, r)) => (k, r.trim()),
        None => (line, ""),
    };

    match keyword.to_uppercase().as_str() {
        "GROUP" => Ok(Command::Group {
            name: (!rest.is_empty()).then(|| rest.to_string()),
        }),
        "?" if rest.is_empty() => Ok(Command::End),
        "FILTER" => parse_filter(rest),
        "EDIT" => parse_edit(rest),
        _ => Err(format!("Unknown command: {keyword}")),
    }
}

/// Split `SEG.f[.c] <remainder>` at the end of the address token.
fn split_address(rest: &str, cmd: &str) -> Result<(String, FieldAddress, String), String> {
    if rest.is_empty() {
        return Err(format!("{cmd} requires SEG.field[.component]"));
    }
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '=')
        .unwrap_or(rest.len());
    let (seg, addr) = parse_segment_address(&rest[..end]).map_err(|e| e.to_string())?;
    Ok((seg, addr, rest[end..].trim().to_string()))
}

/// Parse FILTER command.
fn parse_filter(rest: &str) -> Result<Command, String> {
    // FILTER SEG.f[.c] = "value"
    let (seg, addr, remainder) = split_address(rest, "FILTER")?;
    let value_part = remainder
        .strip_prefix('=')
        .ok_or("FILTER requires = after the address")?;
    let value = parse_value(value_part)?;
    Ok(Command::Filter(FilterPredicate::new(seg, addr, value)))
}

/// Parse EDIT command.
fn parse_edit(rest: &str) -> Result<Command, String> {
    // EDIT SEG.f[.c] = "value" or EDIT SEG.f[.c] CLEAR
    let (seg, addr, remainder) = split_address(rest, "EDIT")?;

    let action = if let Some(value_part) = remainder.strip_prefix('=') {
        EditAction::Set(parse_value(value_part)?)
    } else if remainder.eq_ignore_ascii_case("CLEAR") || remainder.eq_ignore_ascii_case("DELETE") {
        EditAction::Clear
    } else {
        return Err("EDIT requires = \"value\" or CLEAR after the address".to_string());
    };

    Ok(Command::Edit(EditOperation::new(seg, addr, action)))
}

/// Parse a delimited string.
/// The first non-blank character is the delimiter, and the string
/// continues until the next occurrence of that delimiter.
/// Returns (extracted_string, rest_of_input).
fn parse_delimited_string(s: &str) -> Result<(String, &str), String> {
    let s = s.trim_start();
    let Some(delim) = s.chars().next() else {
        return Err("Expected delimited string".to_string());
    };
    let after_delim = &s[delim.len_utf8()..];

    match after_delim.find(delim) {
        Some(end) => {
            let extracted = after_delim[..end].to_string();
            let rest = &after_delim[end + delim.len_utf8()..];
            Ok((extracted, rest))
        }
        None => Err(format!("Unclosed delimiter '{delim}'")),
    }
}

/// Parse a delimited value that must be the last thing on the line.
fn parse_value(s: &str) -> Result<String, String> {
    let (value, rest) = parse_delimited_string(s)?;
    if !rest.trim().is_empty() {
        return Err(format!("Unexpected text after value: {}", rest.trim()));
    }
    Ok(value)
}
