//! Annotation extraction from handler comment blocks.
//!
//! Route handlers describe themselves with `@tag value` directives inside the
//! comment block above the declaration. This module parses that block into a
//! [`DirectiveRecord`]; the collector consumes the record immediately and
//! never persists it.
//!
//! The grammar is line-oriented and tolerant of JSDoc decoration: leading
//! whitespace and `*` markers are stripped, unknown tags are ignored, and the
//! first non-tag line becomes the operation summary.

use log::debug;

/// Parsed form of one handler's annotation block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectiveRecord {
    /// `@openapi` inclusion marker.
    pub openapi: bool,
    /// First non-tag comment line.
    pub summary: Option<String>,
    /// `@desc`/`@description`, or remaining non-tag lines.
    pub description: Option<String>,
    /// `@tag` grouping label.
    pub tag: Option<String>,
    /// `@auth bearer|basic|apikey`.
    pub auth: Option<String>,
    /// `@deprecated` marker.
    pub deprecated: bool,
    /// `@params` — query parameter type name.
    pub params: Option<String>,
    /// `@pathParams` — path parameter type name.
    pub path_params: Option<String>,
    /// `@body` — request body type name.
    pub body: Option<String>,
    /// `@bodyDescription`.
    pub body_description: Option<String>,
    /// `@contentType` override.
    pub content_type: Option<String>,
    /// `@response [code:]TypeName[:description]`.
    pub response: Option<ResponseDirective>,
    /// `@responseDescription`.
    pub response_description: Option<String>,
    /// `@responseSet name[,name...]`; `Some(vec![])` when the route opted out
    /// with `none`, `None` when the tag is absent (the configured default
    /// applies).
    pub response_sets: Option<Vec<String>>,
    /// `@add code[:Schema][,code[:Schema]...]`.
    pub extra_responses: Vec<ExtraResponse>,
}

/// The success-response declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseDirective {
    /// Explicit status code, if given.
    pub status: Option<String>,
    pub type_name: String,
    pub description: Option<String>,
}

/// One ad hoc response entry from `@add`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraResponse {
    pub status: String,
    /// Inline schema name; a bare code references the shared responses table.
    pub schema: Option<String>,
}

impl DirectiveRecord {
    /// Parses a comment block into a record.
    pub fn parse(comment: &str) -> DirectiveRecord {
        let mut record = DirectiveRecord::default();
        let mut free_lines: Vec<&str> = Vec::new();

        for raw_line in comment.lines() {
            let line = clean_line(raw_line);
            if line.is_empty() {
                continue;
            }
            if let Some(rest) = line.strip_prefix('@') {
                let (tag, value) = match rest.split_once(char::is_whitespace) {
                    Some((tag, value)) => (tag, value.trim()),
                    None => (rest, ""),
                };
                record.apply_tag(tag, value);
            } else {
                free_lines.push(line);
            }
        }

        if !free_lines.is_empty() {
            record.summary = Some(free_lines[0].to_string());
            if free_lines.len() > 1 && record.description.is_none() {
                record.description = Some(free_lines[1..].join(" "));
            }
        }
        record
    }

    fn apply_tag(&mut self, tag: &str, value: &str) {
        match tag {
            "openapi" => self.openapi = true,
            "auth" => self.auth = non_empty(value),
            "desc" | "description" => self.description = non_empty(value),
            "tag" => self.tag = non_empty(value),
            "deprecated" => self.deprecated = true,
            "params" => self.params = first_word(value),
            "pathParams" => self.path_params = first_word(value),
            "body" => self.body = first_word(value),
            "bodyDescription" => self.body_description = non_empty(value),
            "contentType" => self.content_type = non_empty(value),
            "response" => self.response = parse_response(value),
            "responseDescription" => self.response_description = non_empty(value),
            "responseSet" => self.response_sets = Some(parse_response_sets(value)),
            "add" => self.extra_responses = parse_extra_responses(value),
            other => debug!("Ignoring unknown annotation tag @{}", other),
        }
    }
}

/// Strips JSDoc decoration from one comment line.
fn clean_line(line: &str) -> &str {
    let mut line = line.trim();
    for marker in ["/**", "*/", "/*", "//"] {
        if let Some(rest) = line.strip_prefix(marker) {
            line = rest.trim();
        }
    }
    line = line.strip_suffix("*/").map(str::trim).unwrap_or(line);
    while let Some(rest) = line.strip_prefix('*') {
        line = rest.trim();
    }
    line
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn first_word(value: &str) -> Option<String> {
    value.split_whitespace().next().map(|word| word.to_string())
}

/// `[code:]TypeName[:description]`
fn parse_response(value: &str) -> Option<ResponseDirective> {
    if value.is_empty() {
        return None;
    }
    let mut parts = value.splitn(3, ':');
    let first = parts.next()?.trim();
    let second = parts.next().map(str::trim);
    let third = parts.next().map(str::trim);

    if first.chars().all(|c| c.is_ascii_digit()) && !first.is_empty() {
        let type_name = second.unwrap_or("").to_string();
        if type_name.is_empty() {
            return None;
        }
        Some(ResponseDirective {
            status: Some(first.to_string()),
            type_name,
            description: third.filter(|d| !d.is_empty()).map(String::from),
        })
    } else {
        // no leading code: everything after the type name is description
        let description = match (second, third) {
            (Some(a), Some(b)) => Some(format!("{}:{}", a, b)),
            (Some(a), None) => Some(a.to_string()),
            _ => None,
        };
        Some(ResponseDirective {
            status: None,
            type_name: first.to_string(),
            description: description.filter(|d| !d.is_empty()),
        })
    }
}

fn parse_response_sets(value: &str) -> Vec<String> {
    if value.eq_ignore_ascii_case("none") {
        return Vec::new();
    }
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

/// `code[:Schema][,code[:Schema]...]`
fn parse_extra_responses(value: &str) -> Vec<ExtraResponse> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let (status, schema) = match entry.split_once(':') {
                Some((status, schema)) => (status.trim(), non_empty(schema.trim())),
                None => (entry, None),
            };
            if status.chars().all(|c| c.is_ascii_digit()) && !status.is_empty() {
                Some(ExtraResponse {
                    status: status.to_string(),
                    schema,
                })
            } else {
                debug!("Ignoring malformed @add entry: {}", entry);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_full_block() {
        let comment = "/**\n * List all orders\n * Supports paging.\n * @openapi\n * @auth bearer\n * @tag Orders\n * @params OrdersQueryParams\n * @pathParams OrderIdParams\n * @body OrderCreate\n * @response 201:Order:Created order\n * @responseSet auth\n * @add 409,418:TeapotSchema\n * @deprecated\n */";
        let record = DirectiveRecord::parse(comment);

        assert!(record.openapi);
        assert_eq!(record.summary.as_deref(), Some("List all orders"));
        assert_eq!(record.description.as_deref(), Some("Supports paging."));
        assert_eq!(record.auth.as_deref(), Some("bearer"));
        assert_eq!(record.tag.as_deref(), Some("Orders"));
        assert_eq!(record.params.as_deref(), Some("OrdersQueryParams"));
        assert_eq!(record.path_params.as_deref(), Some("OrderIdParams"));
        assert_eq!(record.body.as_deref(), Some("OrderCreate"));
        assert!(record.deprecated);

        let response = record.response.unwrap();
        assert_eq!(response.status.as_deref(), Some("201"));
        assert_eq!(response.type_name, "Order");
        assert_eq!(response.description.as_deref(), Some("Created order"));

        assert_eq!(record.response_sets, Some(vec!["auth".to_string()]));
        assert_eq!(
            record.extra_responses,
            vec![
                ExtraResponse { status: "409".to_string(), schema: None },
                ExtraResponse {
                    status: "418".to_string(),
                    schema: Some("TeapotSchema".to_string())
                },
            ]
        );
    }

    #[test]
    fn response_without_code() {
        let record = DirectiveRecord::parse("@response Order");
        let response = record.response.unwrap();
        assert_eq!(response.status, None);
        assert_eq!(response.type_name, "Order");
        assert_eq!(response.description, None);
    }

    #[test]
    fn response_with_description_only() {
        let record = DirectiveRecord::parse("@response Order:The full order");
        let response = record.response.unwrap();
        assert_eq!(response.status, None);
        assert_eq!(response.type_name, "Order");
        assert_eq!(response.description.as_deref(), Some("The full order"));
    }

    #[test]
    fn response_set_none_is_explicit_opt_out() {
        let record = DirectiveRecord::parse("@responseSet none");
        assert_eq!(record.response_sets, Some(vec![]));

        let absent = DirectiveRecord::parse("Just a summary");
        assert_eq!(absent.response_sets, None);
    }

    #[test]
    fn multiple_response_sets() {
        let record = DirectiveRecord::parse("@responseSet auth, common");
        assert_eq!(
            record.response_sets,
            Some(vec!["auth".to_string(), "common".to_string()])
        );
    }

    #[test]
    fn tolerates_line_comment_blocks() {
        let comment = "// Fetch one user\n// @openapi\n// @tag Users";
        let record = DirectiveRecord::parse(comment);
        assert!(record.openapi);
        assert_eq!(record.summary.as_deref(), Some("Fetch one user"));
        assert_eq!(record.tag.as_deref(), Some("Users"));
    }

    #[test]
    fn unknown_tags_are_ignored() {
        let record = DirectiveRecord::parse("@openapi\n@frobnicate everything");
        assert!(record.openapi);
        assert_eq!(record, DirectiveRecord { openapi: true, ..Default::default() });
    }

    #[test]
    fn desc_tag_overrides_free_lines() {
        let record = DirectiveRecord::parse("Summary line\nExtra detail\n@desc Authoritative text");
        assert_eq!(record.summary.as_deref(), Some("Summary line"));
        assert_eq!(record.description.as_deref(), Some("Authoritative text"));
    }

    #[test]
    fn empty_block_yields_default_record() {
        assert_eq!(DirectiveRecord::parse("/** */"), DirectiveRecord::default());
    }
}
