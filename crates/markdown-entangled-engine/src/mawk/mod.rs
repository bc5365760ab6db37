//! # Rule Engine
//!
//! A tiny awk-like interpreter: a document is split into lines and every
//! line is offered to an ordered list of [`Rule`]s.
//!
//! ## Rule outcomes
//!
//! A rule answers each line with a [`RuleOutcome`]:
//!
//! - `NoMatch` - the rule does not apply, the next rule gets a go
//! - `PassThrough` - the rule applies and keeps the line as it is
//! - `Replace(lines)` - the rule applies and emits `lines` instead;
//!   an empty list erases the line
//!
//! ## Modes
//!
//! - [`Mode::Exclusive`]: first rule that applies wins; a line no rule
//!   applies to passes through unchanged.
//! - [`Mode::Pipeline`]: every rule sees the output of the previous one,
//!   flat-mapped line by line.
//!
//! Rules are evaluated in the order of the list handed to [`run`] or
//! [`RuleSet::new`]. Stateful rule sets rely on this: a rule earlier in the
//! list may set state that gates a later one.

use regex::{Captures, Regex};

/// Result of offering one line to one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    NoMatch,
    PassThrough,
    Replace(Vec<String>),
}

impl RuleOutcome {
    /// Matched, and the line disappears from the output.
    pub fn erase() -> Self {
        RuleOutcome::Replace(Vec::new())
    }

    pub fn replace_with(line: impl Into<String>) -> Self {
        RuleOutcome::Replace(vec![line.into()])
    }

    pub fn is_match(&self) -> bool {
        !matches!(self, RuleOutcome::NoMatch)
    }
}

/// How a list of rules is applied to each line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Exclusive,
    Pipeline,
}

/// The line a handler is invoked on, with the capture groups of the rule's
/// pattern when it has one.
#[derive(Debug)]
pub struct LineMatch<'a> {
    line: &'a str,
    captures: Option<Captures<'a>>,
}

impl<'a> LineMatch<'a> {
    pub fn line(&self) -> &'a str {
        self.line
    }

    /// Text of the numbered capture group, if it participated in the match.
    pub fn group(&self, index: usize) -> Option<&'a str> {
        self.captures
            .as_ref()
            .and_then(|c| c.get(index))
            .map(|m| m.as_str())
    }

    /// Text of the named capture group, if it participated in the match.
    pub fn name(&self, name: &str) -> Option<&'a str> {
        self.captures
            .as_ref()
            .and_then(|c| c.name(name))
            .map(|m| m.as_str())
    }
}

enum Matcher {
    Pattern(Regex),
    Always,
}

type Handler<S> = Box<dyn Fn(&mut S, &LineMatch<'_>) -> RuleOutcome>;

/// A named line rule over state `S`.
pub struct Rule<S = ()> {
    name: &'static str,
    matcher: Matcher,
    handler: Handler<S>,
}

impl<S> Rule<S> {
    /// A rule whose `pattern` must match at the start of the line.
    ///
    /// The pattern is anchored, so `"foo"` matches `"foobar"` but not
    /// `"a foo"`. Lines the pattern rejects yield `NoMatch` without calling
    /// the handler.
    pub fn on_match<F>(name: &'static str, pattern: &str, handler: F) -> Result<Self, regex::Error>
    where
        F: Fn(&mut S, &LineMatch<'_>) -> RuleOutcome + 'static,
    {
        let regex = Regex::new(&format!("^(?:{pattern})"))?;
        Ok(Self {
            name,
            matcher: Matcher::Pattern(regex),
            handler: Box::new(handler),
        })
    }

    /// A rule whose handler sees every line.
    pub fn always<F>(name: &'static str, handler: F) -> Self
    where
        F: Fn(&mut S, &LineMatch<'_>) -> RuleOutcome + 'static,
    {
        Self {
            name,
            matcher: Matcher::Always,
            handler: Box::new(handler),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn apply(&self, state: &mut S, line: &str) -> RuleOutcome {
        let captures = match &self.matcher {
            Matcher::Pattern(regex) => match regex.captures(line) {
                Some(captures) => Some(captures),
                None => return RuleOutcome::NoMatch,
            },
            Matcher::Always => None,
        };
        let m = LineMatch { line, captures };
        let outcome = (self.handler)(state, &m);
        log::trace!("rule {} -> {:?}", self.name, outcome);
        outcome
    }
}

impl<S> std::fmt::Debug for Rule<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let matcher = match &self.matcher {
            Matcher::Pattern(regex) => regex.as_str().to_string(),
            Matcher::Always => "<always>".to_string(),
        };
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("matcher", &matcher)
            .finish()
    }
}

/// Split a document into lines on `\n`.
///
/// Returns the lines and whether the input ended with a newline. A `\r`
/// stays attached to its line so CRLF documents survive a round trip.
pub fn split_lines(input: &str) -> (Vec<&str>, bool) {
    (
        input.split_terminator('\n').collect(),
        input.ends_with('\n'),
    )
}

/// Inverse of [`split_lines`].
pub fn join_lines<S: AsRef<str>>(lines: &[S], trailing_newline: bool) -> String {
    let mut out = lines
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n");
    if trailing_newline {
        out.push('\n');
    }
    out
}

/// Run `rules` over every line of `input`.
pub fn run<S>(rules: &[Rule<S>], state: &mut S, input: &str, mode: Mode) -> String {
    let (lines, trailing_newline) = split_lines(input);
    let mut result: Vec<String> = Vec::with_capacity(lines.len());

    for line in lines {
        match mode {
            Mode::Exclusive => result.extend(apply_exclusive(rules, state, line)),
            Mode::Pipeline => result.extend(apply_pipeline(rules, state, line)),
        }
    }

    join_lines(&result, trailing_newline)
}

fn apply_exclusive<S>(rules: &[Rule<S>], state: &mut S, line: &str) -> Vec<String> {
    for rule in rules {
        match rule.apply(state, line) {
            RuleOutcome::NoMatch => continue,
            RuleOutcome::PassThrough => return vec![line.to_string()],
            RuleOutcome::Replace(lines) => return lines,
        }
    }
    vec![line.to_string()]
}

fn apply_pipeline<S>(rules: &[Rule<S>], state: &mut S, line: &str) -> Vec<String> {
    let mut current = vec![line.to_string()];
    for rule in rules {
        let mut next = Vec::with_capacity(current.len());
        for l in current {
            match rule.apply(state, &l) {
                RuleOutcome::NoMatch | RuleOutcome::PassThrough => next.push(l),
                RuleOutcome::Replace(lines) => next.extend(lines),
            }
        }
        current = next;
    }
    current
}

/// An ordered list of rules sharing mutable state.
pub struct RuleSet<S> {
    state: S,
    rules: Vec<Rule<S>>,
}

impl<S> RuleSet<S> {
    pub fn new(state: S, rules: Vec<Rule<S>>) -> Self {
        Self { state, rules }
    }

    pub fn run(&mut self, input: &str, mode: Mode) -> String {
        run(&self.rules, &mut self.state, input, mode)
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(Rule::name).collect()
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn upper() -> Rule {
        Rule::on_match("upper", r"up (.*)", |_, m| {
            RuleOutcome::replace_with(m.group(1).unwrap_or_default().to_uppercase())
        })
        .unwrap()
    }

    fn delete() -> Rule {
        Rule::on_match("delete", r"del\b", |_, _| RuleOutcome::erase()).unwrap()
    }

    fn duplicate() -> Rule {
        Rule::on_match("duplicate", r"dup", |_, m| {
            RuleOutcome::Replace(vec![m.line().to_string(), m.line().to_string()])
        })
        .unwrap()
    }

    #[rstest]
    #[case("up hello", "HELLO")]
    #[case("del this line\nkeep", "keep")]
    #[case("dup\nx", "dup\ndup\nx")]
    #[case("nothing to see", "nothing to see")]
    #[case("say up later", "say up later")]
    fn exclusive_mode_cases(#[case] input: &str, #[case] expected: &str) {
        let rules = vec![upper(), delete(), duplicate()];
        assert_eq!(run(&rules, &mut (), input, Mode::Exclusive), expected);
    }

    #[test]
    fn pattern_is_anchored_at_line_start() {
        let rule = upper();
        assert_eq!(rule.apply(&mut (), "  up x"), RuleOutcome::NoMatch);
        assert!(rule.apply(&mut (), "up x").is_match());
    }

    #[test]
    fn pattern_is_not_anchored_at_line_end() {
        let rule = Rule::<()>::on_match("prefix", "foo", |_, _| RuleOutcome::PassThrough).unwrap();
        assert_eq!(rule.apply(&mut (), "foobar"), RuleOutcome::PassThrough);
    }

    #[test]
    fn first_matching_rule_wins_in_exclusive_mode() {
        let first = Rule::on_match("first", "x", |_, _| RuleOutcome::replace_with("first")).unwrap();
        let second =
            Rule::on_match("second", "x", |_, _| RuleOutcome::replace_with("second")).unwrap();
        assert_eq!(run(&[first, second], &mut (), "x", Mode::Exclusive), "first");
    }

    #[test]
    fn pass_through_stops_later_rules() {
        let keep = Rule::on_match("keep", "x", |_, _| RuleOutcome::PassThrough).unwrap();
        let erase = Rule::on_match("erase", "x", |_, _| RuleOutcome::erase()).unwrap();
        assert_eq!(run(&[keep, erase], &mut (), "x", Mode::Exclusive), "x");
    }

    #[test]
    fn no_match_falls_through_to_next_rule() {
        let decline = Rule::on_match("decline", "x", |_, _| RuleOutcome::NoMatch).unwrap();
        let erase = Rule::on_match("erase", "x", |_, _| RuleOutcome::erase()).unwrap();
        assert_eq!(run(&[decline, erase], &mut (), "x\ny", Mode::Exclusive), "y");
    }

    #[test]
    fn pipeline_mode_chains_rule_outputs() {
        // "dup" doubles the line, then each copy goes through "upper".
        let to_up = Rule::on_match("to_up", "dup", |_, m| {
            RuleOutcome::Replace(vec![format!("up {}", m.line()), format!("up {}", m.line())])
        })
        .unwrap();
        let rules = vec![to_up, upper()];
        assert_eq!(run(&rules, &mut (), "dup\nz", Mode::Pipeline), "DUP\nDUP\nz");
    }

    #[test]
    fn pipeline_mode_erase_stops_the_chain() {
        let rules = vec![delete(), upper()];
        assert_eq!(run(&rules, &mut (), "del\nup a", Mode::Pipeline), "A");
    }

    #[test]
    fn always_rule_sees_every_line() {
        let count = Rule::always("count", |n: &mut usize, _| {
            *n += 1;
            RuleOutcome::NoMatch
        });
        let mut set = RuleSet::new(0usize, vec![count]);
        let out = set.run("a\nb\n\nc", Mode::Exclusive);
        assert_eq!(out, "a\nb\n\nc");
        assert_eq!(*set.state(), 4);
    }

    #[test]
    fn rule_set_state_threads_through_lines() {
        let open = Rule::on_match("open", r"begin", |on: &mut bool, _| {
            *on = true;
            RuleOutcome::erase()
        })
        .unwrap();
        let close = Rule::on_match("close", r"end", |on: &mut bool, _| {
            *on = false;
            RuleOutcome::erase()
        })
        .unwrap();
        let hide = Rule::always("hide", |on: &mut bool, _| {
            if *on {
                RuleOutcome::erase()
            } else {
                RuleOutcome::NoMatch
            }
        });

        let mut set = RuleSet::new(false, vec![open, close, hide]);
        assert_eq!(set.rule_names(), vec!["open", "close", "hide"]);
        assert_eq!(set.run("a\nbegin\nb\nc\nend\nd", Mode::Exclusive), "a\nd");
        assert!(!set.into_state());
    }

    #[test]
    fn named_groups_are_exposed() {
        let rule = Rule::on_match("kv", r"(?P<key>\w+)=(?P<value>\w+)", |_, m| {
            RuleOutcome::replace_with(format!("{}:{}", m.name("key").unwrap(), m.name("value").unwrap()))
        })
        .unwrap();
        assert_eq!(run(&[rule], &mut (), "a=b", Mode::Exclusive), "a:b");
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(Rule::<()>::on_match("bad", "(", |_, _| RuleOutcome::PassThrough).is_err());
    }

    #[rstest]
    #[case("")]
    #[case("one line")]
    #[case("trailing\n")]
    #[case("blank\n\nlines\n\n")]
    #[case("windows\r\nline endings\r\n")]
    fn empty_rule_list_is_identity(#[case] input: &str) {
        let rules: Vec<Rule> = Vec::new();
        assert_eq!(run(&rules, &mut (), input, Mode::Exclusive), input);
        assert_eq!(run(&rules, &mut (), input, Mode::Pipeline), input);
    }
}
