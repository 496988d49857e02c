//! Arithmetic pathway: ordered expression templates, first structural match wins.
//!
//! Templates (most specific first):
//!
//! | # | Name                   | Shape       | Evaluation order        |
//! |---|------------------------|-------------|-------------------------|
//! | 1 | ternary additive       | `a±b±c`     | left to right           |
//! | 2 | ternary multiplicative | `a×÷b×÷c`   | left to right           |
//! | 3 | multiply then add      | `a×÷b±c`    | `a×÷b` first            |
//! | 4 | add then multiply      | `a±b×÷c`    | `b×÷c` first            |
//! | 5 | binary additive        | `a±b`       |                         |
//! | 6 | binary multiplicative  | `a×÷b`      |                         |

use regex::{Captures, Regex};
use std::sync::OnceLock;
use zacai_core::{
    format_number, tokenize, LearnEvent, Pathway, PathwayContext, PathwayData, PathwayKind, PathwayResult,
    ReasoningTrace,
};

/// Confidence for any structural template match.
pub const MATCH_CONFIDENCE: f32 = 0.95;
/// Confidence when a template matched but the operation is undefined.
pub const UNDEFINED_CONFIDENCE: f32 = 0.3;
/// Confidence when no template matched.
pub const NO_MATCH_CONFIDENCE: f32 = 0.1;

/// First-person words that mark a dash-joined number as something the user owns.
const PERSONAL_MARKERS: [&str; 4] = ["i", "my", "me", "mine"];

const NUM: &str = r"(-?\d+(?:\.\d+)?)";
const ADD: &str = r"([+\-])";
const MUL: &str = r"([×÷])";

type Evaluator = fn(&Captures) -> Result<Evaluation, String>;

/// Result value plus human-readable steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub result: f64,
    pub steps: Vec<String>,
}

struct ArithmeticRule {
    name: &'static str,
    shape: [&'static str; 5],
    evaluate: Evaluator,
}

impl ArithmeticRule {
    fn pattern(&self) -> String {
        format!("^{}$", self.shape.concat())
    }
}

const fn rule(name: &'static str, shape: [&'static str; 5], evaluate: Evaluator) -> ArithmeticRule {
    ArithmeticRule { name, shape, evaluate }
}

static RULES: [ArithmeticRule; 6] = [
    rule("ternary additive", [NUM, ADD, NUM, ADD, NUM], left_to_right),
    rule("ternary multiplicative", [NUM, MUL, NUM, MUL, NUM], left_to_right),
    rule("multiply then add", [NUM, MUL, NUM, ADD, NUM], left_to_right),
    rule("add then multiply", [NUM, ADD, NUM, MUL, NUM], right_first),
    rule("binary additive", [NUM, ADD, NUM, "", ""], binary),
    rule("binary multiplicative", [NUM, MUL, NUM, "", ""], binary),
];

fn compiled_rules() -> &'static [(usize, Regex)] {
    static COMPILED: OnceLock<Vec<(usize, Regex)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        RULES
            .iter()
            .enumerate()
            .filter_map(|(i, rule)| match Regex::new(&rule.pattern()) {
                Ok(re) => Some((i, re)),
                Err(e) => {
                    tracing::error!(
                        target: "zacai::pathway",
                        rule = rule.name,
                        error = %e,
                        "Invalid arithmetic template"
                    );
                    None
                }
            })
            .collect()
    })
}

fn span_regex() -> Option<&'static Regex> {
    static SPAN: OnceLock<Option<Regex>> = OnceLock::new();
    SPAN.get_or_init(|| Regex::new(r"-?\d+(?:\.\d+)?(?:[+\-×÷]-?\d+(?:\.\d+)?)+").ok())
        .as_ref()
}

/// Digit groups joined by `-` with no surrounding spaces.
fn dashed_number_regex() -> Option<&'static Regex> {
    static DASHED: OnceLock<Option<Regex>> = OnceLock::new();
    DASHED.get_or_init(|| Regex::new(r"\b\d+(?:-\d+)+\b").ok()).as_ref()
}

/// Dates, phone numbers and similar ids written as `1990-05-12` or `555-1234`. A dashed
/// run counts when it has three or more groups, a zero-padded group, or sits in a
/// sentence about the user.
fn looks_like_identifier(text: &str) -> bool {
    let Some(re) = dashed_number_regex() else {
        return false;
    };
    let personal = tokenize(text)
        .iter()
        .any(|w| PERSONAL_MARKERS.contains(&w.as_str()));
    re.find_iter(text).any(|m| {
        let groups: Vec<&str> = m.as_str().split('-').collect();
        personal
            || groups.len() >= 3
            || groups.iter().skip(1).any(|g| g.len() > 1 && g.starts_with('0'))
    })
}

fn operand(caps: &Captures, i: usize) -> Result<f64, String> {
    let raw = caps.get(i).map(|m| m.as_str()).unwrap_or_default();
    raw.parse::<f64>()
        .map_err(|_| format!("'{}' is not a number I can read", raw))
}

fn operator(caps: &Captures, i: usize) -> char {
    caps.get(i)
        .and_then(|m| m.as_str().chars().next())
        .unwrap_or('+')
}

/// Applies one operation and records the step.
fn apply(a: f64, op: char, b: f64, steps: &mut Vec<String>) -> Result<f64, String> {
    let value = match op {
        '+' => a + b,
        '-' => a - b,
        '×' => a * b,
        '÷' => {
            if b == 0.0 {
                return Err("division by zero is undefined".to_string());
            }
            a / b
        }
        other => return Err(format!("unsupported operator '{}'", other)),
    };
    if !value.is_finite() {
        return Err("the result is too large to represent".to_string());
    }
    let shown = if op == '-' { '−' } else { op };
    steps.push(format!(
        "{} {} {} = {}",
        format_number(a),
        shown,
        format_number(b),
        format_number(value)
    ));
    Ok(value)
}

fn binary(caps: &Captures) -> Result<Evaluation, String> {
    let mut steps = Vec::new();
    let result = apply(operand(caps, 1)?, operator(caps, 2), operand(caps, 3)?, &mut steps)?;
    Ok(Evaluation { result, steps })
}

fn left_to_right(caps: &Captures) -> Result<Evaluation, String> {
    let mut steps = Vec::new();
    let first = apply(operand(caps, 1)?, operator(caps, 2), operand(caps, 3)?, &mut steps)?;
    let result = apply(first, operator(caps, 4), operand(caps, 5)?, &mut steps)?;
    Ok(Evaluation { result, steps })
}

/// `a ± b ×÷ c`: the multiplicative part binds first.
fn right_first(caps: &Captures) -> Result<Evaluation, String> {
    let mut steps = Vec::new();
    let product = apply(operand(caps, 3)?, operator(caps, 4), operand(caps, 5)?, &mut steps)?;
    let result = apply(operand(caps, 1)?, operator(caps, 2), product, &mut steps)?;
    Ok(Evaluation { result, steps })
}

/// Strips whitespace and maps `*`, `/` and a digit-bounded `x` onto `×` / `÷`.
pub fn normalize_expression(text: &str) -> String {
    let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| match c {
            '*' => '×',
            '/' => '÷',
            'x' | 'X'
                if i > 0
                    && chars[i - 1].is_ascii_digit()
                    && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit()) =>
            {
                '×'
            }
            other => other,
        })
        .collect()
}

/// Outcome of matching one expression against the template table.
#[derive(Debug, Clone, PartialEq)]
pub enum ArithmeticOutcome {
    Solved {
        expression: String,
        template: &'static str,
        evaluation: Evaluation,
    },
    Undefined {
        expression: String,
        template: &'static str,
        reason: String,
    },
    NoMatch,
}

/// Normalizes `text`, extracts the arithmetic span and evaluates the first matching template.
pub fn evaluate(text: &str) -> ArithmeticOutcome {
    if looks_like_identifier(text) {
        return ArithmeticOutcome::NoMatch;
    }
    let normalized = normalize_expression(text);
    let Some(span) = span_regex().and_then(|re| re.find(&normalized)) else {
        return ArithmeticOutcome::NoMatch;
    };
    let expression = span.as_str().to_string();

    for (index, re) in compiled_rules() {
        let Some(caps) = re.captures(&expression) else {
            continue;
        };
        let rule = &RULES[*index];
        let evaluated = (rule.evaluate)(&caps);
        drop(caps);
        return match evaluated {
            Ok(evaluation) => ArithmeticOutcome::Solved {
                expression,
                template: rule.name,
                evaluation,
            },
            Err(reason) => ArithmeticOutcome::Undefined {
                expression,
                template: rule.name,
                reason,
            },
        };
    }
    ArithmeticOutcome::NoMatch
}

/// Mathematical pathway executor.
#[derive(Debug, Default)]
pub struct ArithmeticPathway;

impl ArithmeticPathway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Pathway for ArithmeticPathway {
    fn kind(&self) -> PathwayKind {
        PathwayKind::Mathematical
    }

    async fn execute(&self, ctx: &PathwayContext<'_>) -> PathwayResult {
        let mut trace = ReasoningTrace::new();
        match evaluate(ctx.text) {
            ArithmeticOutcome::Solved { expression, template, evaluation } => {
                trace.push(format!("Recognized {} expression {}", template, expression));
                if ctx
                    .store
                    .contains(zacai_core::Category::Mathematics, &expression)
                {
                    trace.push("Solved this expression before");
                }
                for step in &evaluation.steps {
                    trace.push(step.clone());
                }
                let learn = vec![LearnEvent::Calculation {
                    expression: expression.clone(),
                    result: evaluation.result,
                    steps: evaluation.steps.clone(),
                }];
                PathwayResult::new(
                    PathwayKind::Mathematical,
                    MATCH_CONFIDENCE,
                    Some(PathwayData::Calculation {
                        expression,
                        result: evaluation.result,
                        steps: evaluation.steps,
                    }),
                )
                .with_trace(trace)
                .with_learn(learn)
            }
            ArithmeticOutcome::Undefined { expression, template, reason } => {
                trace.push(format!("Recognized {} expression {}", template, expression));
                trace.push(format!("Cannot evaluate: {}", reason));
                tracing::debug!(
                    target: "zacai::pathway",
                    expression = %expression,
                    reason = %reason,
                    "Undefined arithmetic"
                );
                PathwayResult::new(
                    PathwayKind::Mathematical,
                    UNDEFINED_CONFIDENCE,
                    Some(PathwayData::ArithmeticError { expression, reason }),
                )
                .with_trace(trace)
            }
            ArithmeticOutcome::NoMatch => {
                trace.push("No arithmetic pattern recognized");
                PathwayResult::miss(PathwayKind::Mathematical, NO_MATCH_CONFIDENCE).with_trace(trace)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solved(text: &str) -> (f64, Vec<String>, &'static str) {
        match evaluate(text) {
            ArithmeticOutcome::Solved { evaluation, template, .. } => {
                (evaluation.result, evaluation.steps, template)
            }
            other => panic!("expected a solution for {text}, got {other:?}"),
        }
    }

    #[test]
    fn multiply_binds_before_add() {
        let (result, steps, template) = solved("3×3+3");
        assert_eq!(result, 12.0);
        assert_eq!(steps, vec!["3 × 3 = 9", "9 + 3 = 12"]);
        assert_eq!(template, "multiply then add");

        let (result, steps, template) = solved("2 + 3 * 4");
        assert_eq!(result, 14.0);
        assert_eq!(steps, vec!["3 × 4 = 12", "2 + 12 = 14"]);
        assert_eq!(template, "add then multiply");
    }

    #[test]
    fn binary_operations_are_exact() {
        assert_eq!(solved("7 - 10").0, -3.0);
        assert_eq!(solved("6 / 4").0, 1.5);
        assert_eq!(solved("12x3").0, 36.0);
        assert_eq!(solved("what is 2.5 + 2.5?").0, 5.0);
    }

    #[test]
    fn ternary_templates_evaluate_left_to_right() {
        assert_eq!(solved("1+2+3").0, 6.0);
        assert_eq!(solved("10-4+1").0, 7.0);
        assert_eq!(solved("2*3*4").0, 24.0);
        assert_eq!(solved("100/5/2").0, 10.0);
    }

    #[test]
    fn division_by_zero_is_undefined() {
        match evaluate("5/0") {
            ArithmeticOutcome::Undefined { reason, .. } => assert!(reason.contains("division by zero")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unsupported_shapes_do_not_match() {
        assert_eq!(evaluate("1+2+3+4"), ArithmeticOutcome::NoMatch);
        assert_eq!(evaluate("hello there"), ArithmeticOutcome::NoMatch);
        assert_eq!(evaluate("42"), ArithmeticOutcome::NoMatch);
    }

    #[test]
    fn dates_and_phone_numbers_are_not_subtraction() {
        assert_eq!(evaluate("I was born on 1990-05-12"), ArithmeticOutcome::NoMatch);
        assert_eq!(evaluate("my phone number is 555-1234"), ArithmeticOutcome::NoMatch);
        assert_eq!(evaluate("order 12-03-7 shipped"), ArithmeticOutcome::NoMatch);
        assert_eq!(evaluate("the meeting is on 2024-06"), ArithmeticOutcome::NoMatch);

        assert_eq!(solved("what is 555-1234").0, -679.0);
        assert_eq!(solved("10 - 4 - 1").0, 5.0);
    }

    #[test]
    fn subtraction_steps_use_minus_sign() {
        let (_, steps, _) = solved("9-3");
        assert_eq!(steps, vec!["9 − 3 = 6"]);
    }
}
