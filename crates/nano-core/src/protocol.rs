//! Response Protocol
//!
//! The model signals its state through a small tag language embedded in free
//! text:
//!
//! ```text
//! <Plan id=0>
//!     <0>Look up the company name</0>
//!     <1>Find the company address</1>
//! </Plan>
//! <Execute plan=0 step=0>{"execute_tool": "company_name", "params": {"item_number": "3458"}}</Execute>
//! <Ask plan=0 step=1>Which item?</Ask>
//! <Message plan=0 step=1>Looking it up...</Message>
//! <Answer plan=0>Return package to Winstonstr. 356, NY
//!     <Widget plan=0 name="map">{"latitude": [40.7], "longitude": [-74.0]}</Widget>
//! </Answer>
//! <FormattedAnswer plan=0 step=0>...</FormattedAnswer>
//! ```
//!
//! Tag names are case-sensitive and attributes must appear in the order shown.
//! For `Plan`, `Execute` and `Answer` only the first well-formed opening tag is
//! considered, closed by the next matching closing tag. Bodies may span lines.
//! A missing tag is a normal outcome, never an error.

use serde::Serialize;

use crate::tool::ToolInvocation;

/// An ordered list of steps the model commits to
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub id: u64,
    pub steps: Vec<String>,
}

/// A tool call requested by an `<Execute>` tag
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExecutionRequest {
    pub plan_id: u64,
    pub step: u64,
    #[serde(flatten)]
    pub invocation: ToolInvocation,
}

impl ExecutionRequest {
    pub fn tool_name(&self) -> &str {
        &self.invocation.tool_name
    }
}

/// Outcome of looking for an `<Execute>` tag
#[derive(Clone, Debug, PartialEq)]
pub enum Execution {
    /// No Execute tag in the completion
    Absent,
    /// Tag present but its payload is not a usable tool invocation
    Malformed {
        plan_id: u64,
        step: u64,
        error: String,
    },
    Request(ExecutionRequest),
}

/// Final response of a plan
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub plan_id: u64,
    pub step: Option<u64>,
    pub body: String,
}

/// A widget embedded in an answer
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WidgetInvocation {
    pub plan_id: u64,
    pub name: String,
    /// Raw JSON payload as written by the model
    pub payload: String,
}

impl WidgetInvocation {
    pub fn params(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.payload)
    }
}

/// Extract the first `<Plan id=N>` block and its numbered steps.
pub fn parse_plan(text: &str) -> Option<Plan> {
    let tag = Tags::new(text, "Plan")
        .accepting(|attrs| int_attrs(attrs, &["id"]).is_some())
        .next()?;
    let &[id] = int_attrs(tag.attrs, &["id"])?.as_slice() else {
        return None;
    };
    Some(Plan {
        id,
        steps: parse_steps(tag.body),
    })
}

/// Classify the first `<Execute plan=N step=M>` tag.
pub fn parse_execution(text: &str) -> Execution {
    let found = Tags::new(text, "Execute")
        .accepting(|attrs| int_attrs(attrs, &["plan", "step"]).is_some())
        .next()
        .and_then(|tag| match int_attrs(tag.attrs, &["plan", "step"])?.as_slice() {
            &[plan_id, step] => Some((plan_id, step, tag.body)),
            _ => None,
        });

    let Some((plan_id, step, body)) = found else {
        return Execution::Absent;
    };

    match serde_json::from_str::<ToolInvocation>(body.trim()) {
        Ok(invocation) => Execution::Request(ExecutionRequest {
            plan_id,
            step,
            invocation,
        }),
        Err(e) => Execution::Malformed {
            plan_id,
            step,
            error: e.to_string(),
        },
    }
}

/// Extract the first `<Answer plan=N>` (optionally `step=M`) block.
pub fn parse_answer(text: &str) -> Option<Answer> {
    let tag = Tags::new(text, "Answer")
        .accepting(|attrs| answer_attrs(attrs).is_some())
        .next()?;
    let (plan_id, step) = answer_attrs(tag.attrs)?;
    Some(Answer {
        plan_id,
        step,
        body: tag.body.to_owned(),
    })
}

/// `plan=N` with an optional trailing `step=M`
fn answer_attrs(raw: &str) -> Option<(u64, Option<u64>)> {
    match int_attrs(raw, &["plan", "step"]).as_deref() {
        Some(&[plan, step]) => Some((plan, Some(step))),
        _ => match int_attrs(raw, &["plan"]).as_deref() {
            Some(&[plan]) => Some((plan, None)),
            _ => None,
        },
    }
}

/// Bodies of every `<Ask ...>` tag
pub fn ask_segments(text: &str) -> Vec<&str> {
    Tags::new(text, "Ask").map(|t| t.body).collect()
}

/// Bodies of every `<Message ...>` tag
pub fn message_segments(text: &str) -> Vec<&str> {
    Tags::new(text, "Message").map(|t| t.body).collect()
}

/// Bodies of every `<Answer ...>` tag
pub fn answer_segments(text: &str) -> Vec<&str> {
    Tags::new(text, "Answer").map(|t| t.body).collect()
}

/// Bodies of every `<FormattedAnswer ...>` tag
pub fn formatted_answer_segments(text: &str) -> Vec<&str> {
    Tags::new(text, "FormattedAnswer").map(|t| t.body).collect()
}

/// Every `<Widget plan=N name="X">` tag, in order
pub fn parse_widgets(text: &str) -> Vec<WidgetInvocation> {
    widget_tags(text)
        .filter_map(|tag| {
            let (plan_id, name) = widget_attrs(tag.attrs)?;
            Some(WidgetInvocation {
                plan_id,
                name: name.to_owned(),
                payload: tag.body.trim().to_owned(),
            })
        })
        .collect()
}

fn widget_attrs(raw: &str) -> Option<(u64, &str)> {
    let attrs = parse_attrs(raw)?;
    let &[("plan", plan), ("name", name)] = attrs.as_slice() else {
        return None;
    };
    Some((parse_int(plan)?, name))
}

fn widget_tags(text: &str) -> Tags<'_> {
    Tags::new(text, "Widget").accepting(|attrs| widget_attrs(attrs).is_some())
}

/// Remove every widget tag from the text
pub fn strip_widgets(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for tag in widget_tags(text) {
        out.push_str(&text[cursor..tag.start]);
        cursor = tag.end;
    }
    out.push_str(&text[cursor..]);
    out
}

/// Assemble the user-visible part of a completion.
///
/// Ask and Message segments come first, then the answer (the
/// `FormattedAnswer` when `formatted` is set). Widget tags are removed. When
/// no display tag is present the whole widget-free text is returned.
pub fn display_text(text: &str, formatted: bool) -> String {
    let stripped = strip_widgets(text);

    let mut segments: Vec<&str> = ask_segments(text);
    segments.extend(message_segments(text));
    if formatted {
        segments.extend(formatted_answer_segments(&stripped));
    } else {
        segments.extend(answer_segments(&stripped));
    }

    if segments.is_empty() {
        return stripped.trim().to_owned();
    }

    segments
        .iter()
        .map(|s| s.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Numbered steps `<N>text</N>` in match order. The number in the tag is
/// only used to pair opening and closing tags.
///
/// Step bodies may span lines; a wrapped step is kept whole, not dropped.
fn parse_steps(body: &str) -> Vec<String> {
    let mut steps = Vec::new();
    let mut cursor = 0;

    while let Some(rel) = body[cursor..].find('<') {
        let open = cursor + rel;
        let digits_start = open + 1;
        let digits_len = body[digits_start..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        let gt = digits_start + digits_len;

        if digits_len == 0 || body.as_bytes().get(gt) != Some(&b'>') {
            cursor = open + 1;
            continue;
        }

        let close = format!("</{}>", &body[digits_start..gt]);
        let content_start = gt + 1;
        match body[content_start..].find(&close) {
            Some(len) => {
                steps.push(body[content_start..content_start + len].to_owned());
                cursor = content_start + len + close.len();
            }
            None => cursor = open + 1,
        }
    }

    steps
}

/// One occurrence of `<Name attrs>body</Name>`
#[derive(Clone, Copy, Debug)]
struct RawTag<'a> {
    attrs: &'a str,
    body: &'a str,
    start: usize,
    end: usize,
}

/// Integer attributes, only if the keys are exactly `keys` in that order
fn int_attrs(raw: &str, keys: &[&str]) -> Option<Vec<u64>> {
    let attrs = parse_attrs(raw)?;
    if attrs.len() != keys.len() {
        return None;
    }
    attrs
        .iter()
        .zip(keys)
        .map(|((key, value), expected)| {
            if key == expected {
                parse_int(value)
            } else {
                None
            }
        })
        .collect()
}

/// Non-overlapping occurrences of one tag kind, left to right
struct Tags<'a> {
    text: &'a str,
    open: String,
    close: String,
    cursor: usize,
    accept: fn(&str) -> bool,
}

impl<'a> Tags<'a> {
    fn new(text: &'a str, name: &str) -> Self {
        Self {
            text,
            open: format!("<{name}"),
            close: format!("</{name}>"),
            cursor: 0,
            accept: |_| true,
        }
    }

    /// Only yield tags whose attribute text passes `accept`. A rejected
    /// opening tag is skipped on its own, leaving later tags reachable.
    fn accepting(mut self, accept: fn(&str) -> bool) -> Self {
        self.accept = accept;
        self
    }
}

impl<'a> Iterator for Tags<'a> {
    type Item = RawTag<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let start = self.cursor + self.text.get(self.cursor..)?.find(&self.open)?;
            let after_name = start + self.open.len();

            // `<Answer` must not match `<AnswerX`
            match self.text.as_bytes().get(after_name) {
                Some(b'>' | b' ' | b'\t' | b'\n' | b'\r') => {}
                _ => {
                    self.cursor = after_name;
                    continue;
                }
            }

            let gt = after_name + self.text[after_name..].find('>')?;
            let attrs = self.text[after_name..gt].trim();
            if !(self.accept)(attrs) {
                self.cursor = after_name;
                continue;
            }

            let body_start = gt + 1;
            let body_len = self.text[body_start..].find(&self.close)?;
            let end = body_start + body_len + self.close.len();

            self.cursor = end;
            return Some(RawTag {
                attrs,
                body: &self.text[body_start..body_start + body_len],
                start,
                end,
            });
        }
    }
}

/// Parse `key=value key="quoted value"` pairs
fn parse_attrs(raw: &str) -> Option<Vec<(&str, &str)>> {
    let mut attrs = Vec::new();
    let mut rest = raw.trim_start();

    while !rest.is_empty() {
        let eq = rest.find('=')?;
        let key = &rest[..eq];
        if key.is_empty() || !key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return None;
        }
        rest = &rest[eq + 1..];

        let value;
        if let Some(quoted) = rest.strip_prefix('"') {
            let close = quoted.find('"')?;
            value = &quoted[..close];
            rest = &quoted[close + 1..];
        } else {
            let stop = rest.find(char::is_whitespace).unwrap_or(rest.len());
            value = &rest[..stop];
            rest = &rest[stop..];
        }

        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return None;
        }
        attrs.push((key, value));
        rest = rest.trim_start();
    }

    Some(attrs)
}

fn parse_int(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PLAN: &str = r#"Let me plan this.
<Plan id=0>
    <0>"Get the company name using tool company_name"</0>
    <1>Get adress of company from step 0.</1>
</Plan>"#;

    #[test]
    fn test_plan_steps_in_match_order() {
        let plan = parse_plan(PLAN).unwrap();
        assert_eq!(plan.id, 0);
        assert_eq!(
            plan.steps,
            vec![
                "\"Get the company name using tool company_name\"".to_string(),
                "Get adress of company from step 0.".to_string(),
            ]
        );
        assert_eq!(parse_plan(PLAN), Some(plan));
    }

    #[test]
    fn test_plan_step_numbers_do_not_reorder() {
        let plan = parse_plan("<Plan id=7><2>second</2><1>first</1></Plan>").unwrap();
        assert_eq!(plan.id, 7);
        assert_eq!(plan.steps, vec!["second", "first"]);
    }

    #[test]
    fn test_plan_step_needs_matching_close() {
        let plan = parse_plan("<Plan id=1><0>dangling</1><2>kept</2></Plan>").unwrap();
        assert_eq!(plan.steps, vec!["kept"]);
    }

    #[test]
    fn test_multiline_step() {
        let plan = parse_plan("<Plan id=3><0>line one\nline two</0></Plan>").unwrap();
        assert_eq!(plan.steps, vec!["line one\nline two"]);
    }

    #[test]
    fn test_no_plan() {
        assert!(parse_plan("just text").is_none());
        assert!(parse_plan("<Plan id=x><0>a</0></Plan>").is_none());
        assert!(parse_plan("<plan id=0><0>a</0></plan>").is_none());
        assert!(parse_plan("<Plan id=0><0>unterminated</0>").is_none());
    }

    #[test]
    fn test_execution_request() {
        let text = "<Execute plan=0 step=1>\n{\"execute_tool\": \"company_name\", \"params\": {\"item_number\": \"3458\"}}\n</Execute>";
        match parse_execution(text) {
            Execution::Request(req) => {
                assert_eq!(req.plan_id, 0);
                assert_eq!(req.step, 1);
                assert_eq!(req.tool_name(), "company_name");
                assert_eq!(req.invocation.params["item_number"], json!("3458"));
            }
            other => panic!("expected request, got {other:?}"),
        }
    }

    #[test]
    fn test_execution_without_params() {
        let text = r#"<Execute plan=2 step=0>{"execute_tool": "now"}</Execute>"#;
        let Execution::Request(req) = parse_execution(text) else {
            panic!("expected request");
        };
        assert!(req.invocation.params.is_empty());
    }

    #[test]
    fn test_malformed_execution_is_distinct_from_absent() {
        let bad = r#"<Execute plan=0 step=0>{"execute_tool": "weather", "params": {</Execute>"#;
        assert!(matches!(
            parse_execution(bad),
            Execution::Malformed { plan_id: 0, step: 0, .. }
        ));

        let missing_key = r#"<Execute plan=0 step=0>{"tool": "weather"}</Execute>"#;
        assert!(matches!(parse_execution(missing_key), Execution::Malformed { .. }));

        assert_eq!(parse_execution("no tags here"), Execution::Absent);
    }

    #[test]
    fn test_execution_attribute_order_is_fixed() {
        let text = r#"<Execute step=0 plan=0>{"execute_tool": "x"}</Execute>"#;
        assert_eq!(parse_execution(text), Execution::Absent);
    }

    #[test]
    fn test_first_execution_wins() {
        let text = r#"<Execute plan=0 step=0>{"execute_tool": "a"}</Execute>
<Execute plan=0 step=1>{"execute_tool": "b"}</Execute>"#;
        let Execution::Request(req) = parse_execution(text) else {
            panic!("expected request");
        };
        assert_eq!(req.tool_name(), "a");
    }

    #[test]
    fn test_bare_tag_mention_does_not_hide_later_tag() {
        let text = "Next I send an <Execute> request:\n\
<Execute plan=0 step=0>{\"execute_tool\": \"weather\", \"params\": {}}</Execute>";
        let Execution::Request(req) = parse_execution(text) else {
            panic!("expected request");
        };
        assert_eq!(req.tool_name(), "weather");

        let plan = parse_plan("My <Plan> follows.\n<Plan id=0><0>a</0></Plan>").unwrap();
        assert_eq!(plan.id, 0);
        assert_eq!(plan.steps, vec!["a"]);

        let answer = parse_answer("An <Answer> comes now: <Answer plan=2>Berlin</Answer>").unwrap();
        assert_eq!(answer.plan_id, 2);
        assert_eq!(answer.body, "Berlin");

        let text = r#"A <Widget> follows <Widget plan=0 name="map">{"latitude": [1]}</Widget>"#;
        let widgets = parse_widgets(text);
        assert_eq!(widgets.len(), 1);
        assert_eq!(widgets[0].name, "map");
        assert_eq!(strip_widgets(text), "A <Widget> follows ");
    }

    #[test]
    fn test_answer_with_and_without_step() {
        let a = parse_answer("<Answer plan=0>Return to\nWinstonstr. 356</Answer>").unwrap();
        assert_eq!(a.plan_id, 0);
        assert_eq!(a.step, None);
        assert_eq!(a.body, "Return to\nWinstonstr. 356");

        let b = parse_answer("<Answer plan=1 step=2>done</Answer>").unwrap();
        assert_eq!(b.step, Some(2));
    }

    #[test]
    fn test_formatted_answer_is_not_an_answer() {
        assert!(parse_answer("<FormattedAnswer plan=0 step=0>x</FormattedAnswer>").is_none());
    }

    #[test]
    fn test_widgets_parsed_and_stripped() {
        let text = r#"<Answer plan=0>Here you go
<Widget plan=0 name="map">{"latitude": [52.5], "longitude": [13.4]}</Widget>
</Answer>"#;
        let widgets = parse_widgets(text);
        assert_eq!(widgets.len(), 1);
        assert_eq!(widgets[0].name, "map");
        assert_eq!(widgets[0].params().unwrap()["latitude"], json!([52.5]));

        assert!(!strip_widgets(text).contains("Widget"));
        assert_eq!(display_text(text, false), "Here you go");
    }

    #[test]
    fn test_display_text_groups_segments() {
        let text = "<Message plan=0 step=0>Checking</Message> noise <Ask plan=0 step=1>Which city?</Ask>";
        assert_eq!(display_text(text, false), "Which city?\n\nChecking");
        assert_eq!(display_text("plain reply", false), "plain reply");
    }

    #[test]
    fn test_display_text_formatted() {
        let text = "<FormattedAnswer plan=0 step=0>Short.</FormattedAnswer>";
        assert_eq!(display_text(text, true), "Short.");
    }
}
