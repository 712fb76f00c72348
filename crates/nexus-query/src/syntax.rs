//! Query grammar using chumsky.
//!
//! Each clause parses into a [`Clause`]; the clause list is then folded into
//! a [`QueryRequest`], rejecting duplicates.

use chumsky::extra;
use chumsky::prelude::*;
use serde_json::Value;

use nexus_config::OutputFormat;

use crate::ast::{
    Condition, Filter, Operator, Output, Projection, QueryRequest, Sort, SortDirection,
};
use crate::error::{QueryError, QueryResult};

/// Extra type for parsers - uses Rich errors for better messages
pub type Extra<'src> = extra::Err<Rich<'src, char>>;

const RESERVED: &[&str] = &[
    "from", "where", "sort", "limit", "table", "list", "and", "or", "as", "asc", "desc",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connective {
    And,
    Or,
}

#[derive(Debug, Clone)]
enum Clause {
    From(String),
    Where(Filter),
    Sort(Sort),
    Limit(usize),
    Output(Output),
}

impl Clause {
    fn name(&self) -> &'static str {
        match self {
            Clause::From(_) => "FROM",
            Clause::Where(_) => "WHERE",
            Clause::Sort(_) => "SORT",
            Clause::Limit(_) => "LIMIT",
            Clause::Output(_) => "TABLE/LIST",
        }
    }
}

/// Parse query text into a request.
///
/// Tag shorthand is not handled here; see [`crate::expand_tag_shorthand`].
pub fn parse(input: &str) -> QueryResult<QueryRequest> {
    let clauses = query_parser()
        .parse(input)
        .into_result()
        .map_err(|errs| QueryError::Parse(format_errors(&errs, input)))?;

    build_request(clauses)
}

fn build_request(clauses: Vec<Clause>) -> QueryResult<QueryRequest> {
    let mut request = QueryRequest::default();

    for clause in clauses {
        let name = clause.name();
        let duplicate = match clause {
            Clause::From(folder) => request.from.replace(folder).is_some(),
            Clause::Where(filter) => request.filter.replace(filter).is_some(),
            Clause::Sort(sort) => request.sort.replace(sort).is_some(),
            Clause::Limit(limit) => request.limit.replace(limit).is_some(),
            Clause::Output(output) => request.output.replace(output).is_some(),
        };
        if duplicate {
            return Err(QueryError::DuplicateClause(name));
        }
    }

    Ok(request)
}

// ============================================================================
// Clauses
// ============================================================================

fn query_parser<'src>() -> impl Parser<'src, &'src str, Vec<Clause>, Extra<'src>> {
    choice((
        from_clause(),
        where_clause(),
        sort_clause(),
        limit_clause(),
        table_clause(),
        list_clause(),
    ))
    .repeated()
    .collect::<Vec<_>>()
    .padded()
    .then_ignore(end())
}

fn from_clause<'src>() -> impl Parser<'src, &'src str, Clause, Extra<'src>> + Clone {
    let bare = bare_literal(" \t\r\n\"'").map(|s: &str| s.to_string());

    kw("FROM")
        .ignore_then(string_literal().or(bare).padded())
        .map(|folder| Clause::From(folder.trim_matches('/').to_string()))
        .labelled("FROM \"folder\"")
}

fn where_clause<'src>() -> impl Parser<'src, &'src str, Clause, Extra<'src>> + Clone {
    let connective = choice((
        kw("AND").to(Connective::And),
        kw("OR").to(Connective::Or),
    ));

    kw("WHERE")
        .ignore_then(condition())
        .then(connective.then(condition()).repeated().collect::<Vec<_>>())
        .map(|(first, rest)| {
            let mut groups = vec![vec![first]];
            for (connective, condition) in rest {
                match connective {
                    Connective::And => {
                        if let Some(group) = groups.last_mut() {
                            group.push(condition);
                        }
                    }
                    Connective::Or => groups.push(vec![condition]),
                }
            }
            Clause::Where(Filter { groups })
        })
        .labelled("WHERE condition")
}

fn sort_clause<'src>() -> impl Parser<'src, &'src str, Clause, Extra<'src>> + Clone {
    let direction = choice((
        kw("ASC").to(SortDirection::Asc),
        kw("DESC").to(SortDirection::Desc),
    ));

    kw("SORT")
        .ignore_then(field().padded())
        .then(direction.or_not())
        .map(|(field, direction)| {
            Clause::Sort(Sort {
                field,
                direction: direction.unwrap_or_default(),
            })
        })
        .labelled("SORT field [ASC|DESC]")
}

fn limit_clause<'src>() -> impl Parser<'src, &'src str, Clause, Extra<'src>> + Clone {
    kw("LIMIT")
        .ignore_then(integer().padded())
        .map(Clause::Limit)
        .labelled("LIMIT n")
}

fn table_clause<'src>() -> impl Parser<'src, &'src str, Clause, Extra<'src>> + Clone {
    kw("TABLE")
        .ignore_then(
            projection()
                .separated_by(just(',').padded())
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .map(|fields| {
            Clause::Output(Output {
                format: OutputFormat::Table,
                fields,
            })
        })
        .labelled("TABLE field [as alias], ...")
}

fn list_clause<'src>() -> impl Parser<'src, &'src str, Clause, Extra<'src>> + Clone {
    kw("LIST")
        .ignore_then(
            projection()
                .separated_by(just(',').padded())
                .collect::<Vec<_>>(),
        )
        .map(|fields| {
            Clause::Output(Output {
                format: OutputFormat::List,
                fields,
            })
        })
        .labelled("LIST [field, ...]")
}

// ============================================================================
// Conditions
// ============================================================================

fn condition<'src>() -> impl Parser<'src, &'src str, Condition, Extra<'src>> + Clone {
    let contains = kw("contains")
        .ignore_then(just('(').padded())
        .ignore_then(field().padded())
        .then_ignore(just(',').padded())
        .then(value(" \t\r\n\"'),").padded())
        .then_ignore(just(')').padded())
        .map(|(field, value)| Condition {
            field,
            op: Operator::Contains,
            value,
        })
        .labelled("contains(field, \"value\")");

    // Longest operators first
    let op = choice((
        just(">=").to(Operator::Ge),
        just("<=").to(Operator::Le),
        just("!=").to(Operator::Ne),
        just("=").to(Operator::Eq),
        just(">").to(Operator::Gt),
        just("<").to(Operator::Lt),
    ))
    .padded();

    let comparison = field()
        .padded()
        .then(op)
        .then(value(" \t\r\n\"'").padded())
        .map(|((field, op), value)| Condition { field, op, value })
        .labelled("field <op> value");

    choice((contains, comparison))
}

fn projection<'src>() -> impl Parser<'src, &'src str, Projection, Extra<'src>> + Clone {
    let alias = kw("as").ignore_then(string_literal().or(field()).padded());

    field()
        .padded()
        .then(alias.or_not())
        .map(|(field, alias)| Projection { field, alias })
}

// ============================================================================
// Primitives
// ============================================================================

/// Field name: letters, digits, `_`, `-` and `.` for nested paths. Clause
/// keywords are not fields.
fn field<'src>() -> impl Parser<'src, &'src str, String, Extra<'src>> + Clone {
    any()
        .filter(|c: &char| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .repeated()
        .at_least(1)
        .to_slice()
        .try_map(|s: &str, span| {
            if RESERVED.iter().any(|k| s.eq_ignore_ascii_case(k)) {
                Err(Rich::custom(span, format!("'{}' is a keyword, not a field", s)))
            } else {
                Ok(s.to_string())
            }
        })
        .labelled("field name")
}

/// Quoted string, or a bare run of characters not in `stops` typed as a
/// number or boolean when it parses as one
fn value<'src>(stops: &'static str) -> impl Parser<'src, &'src str, Value, Extra<'src>> + Clone {
    let quoted = string_literal().map(Value::String);
    let bare = bare_literal(stops).map(classify);

    choice((quoted, bare)).labelled("value")
}

fn bare_literal<'src>(stops: &'static str) -> impl Parser<'src, &'src str, &'src str, Extra<'src>> + Clone {
    none_of(stops).repeated().at_least(1).to_slice()
}

fn classify(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Some(n) = raw
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(serde_json::Number::from_f64)
    {
        return Value::Number(n);
    }
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(raw.to_string())
}

fn string_literal<'src>() -> impl Parser<'src, &'src str, String, Extra<'src>> + Clone {
    let double = just('"')
        .ignore_then(none_of("\"").repeated().to_slice())
        .then_ignore(just('"'));
    let single = just('\'')
        .ignore_then(none_of("'").repeated().to_slice())
        .then_ignore(just('\''));

    double
        .or(single)
        .map(|s: &str| s.to_string())
        .labelled("string literal")
}

fn integer<'src>() -> impl Parser<'src, &'src str, usize, Extra<'src>> + Clone {
    any()
        .filter(|c: &char| c.is_ascii_digit())
        .repeated()
        .at_least(1)
        .to_slice()
        .try_map(|s: &str, span| {
            s.parse::<usize>()
                .map_err(|_| Rich::custom(span, "integer overflow"))
        })
        .labelled("integer")
}

/// Case-insensitive keyword matcher
fn kw<'src>(keyword: &'static str) -> impl Parser<'src, &'src str, (), Extra<'src>> + Clone {
    any()
        .filter(|c: &char| c.is_alphabetic())
        .repeated()
        .at_least(1)
        .to_slice()
        .try_map(move |s: &str, span| {
            if s.eq_ignore_ascii_case(keyword) {
                Ok(())
            } else {
                Err(Rich::custom(span, format!("expected keyword '{}'", keyword)))
            }
        })
        .padded()
}

/// Format chumsky errors with line and column
pub fn format_errors(errs: &[Rich<'_, char>], input: &str) -> String {
    errs.iter()
        .map(|e| {
            let start = e.span().start;
            let line = input[..start].lines().count().max(1);
            let col = start - input[..start].rfind('\n').map_or(0, |i| i + 1);

            let found = e
                .found()
                .map_or("end of input".to_string(), |c| format!("'{}'", c));

            format!("Line {}, column {}: {} (found {})", line, col + 1, e.reason(), found)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
