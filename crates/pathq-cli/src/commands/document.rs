//! JSON query documents.
//!
//! A document holds the forwarding policy, the queries and, optionally, the
//! compiler configuration:
//!
//! ```json
//! {
//!   "config": { "tag_bits": 8 },
//!   "forwarding": { "seq": [{ "filter": { "match": { "switch": 1 } } }, { "fwd": 2 }] },
//!   "queries": [
//!     { "bucket": 1, "path": { "concat": [
//!       { "atom": { "match": { "srcip": "10.0.0.1" } } },
//!       { "hook": { "pred": { "match": { "switch": 2 } }, "fields": ["inport"], "bucket": 9 } },
//!       { "end_path": { "match": { "switch": 3 } } }
//!     ] } }
//!   ]
//! }
//! ```
//!
//! Field values are numbers, strings (`"10.0.0.0/24"`, `"unset"`) or `null`
//! for an absent field.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::Path as FsPath;

use pathq_compiler::{CompileError, CompiledPolicy, CompilerConfig, Path, PathQuery, Session};
use pathq_core::{BucketId, Field, Policy, Pred, Value};
use serde::Deserialize;
use serde_json::Value as Json;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for `{field}`: {value}")]
    InvalidValue { field: Field, value: String },

    #[error("`{0}` needs at least one operand")]
    EmptyOperands(&'static str),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    #[serde(default)]
    pub config: CompilerConfig,
    #[serde(default)]
    pub forwarding: PolicyDoc,
    pub queries: Vec<QueryDoc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryDoc {
    pub bucket: BucketId,
    pub path: PathDoc,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredDoc {
    Identity,
    Drop,
    Match(BTreeMap<Field, Json>),
    And(Vec<PredDoc>),
    Or(Vec<PredDoc>),
    Not(Box<PredDoc>),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyDoc {
    #[default]
    Identity,
    Drop,
    Filter(PredDoc),
    /// Assignments applied in field order.
    Modify(BTreeMap<Field, Json>),
    Fwd(u64),
    Seq(Vec<PolicyDoc>),
    Par(Vec<PolicyDoc>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathDoc {
    Atom(PredDoc),
    Hook {
        pred: PredDoc,
        #[serde(default)]
        fields: Vec<Field>,
        bucket: BucketId,
    },
    EndPath(PredDoc),
    Drop(PredDoc),
    Concat(Vec<PathDoc>),
    Alt(Vec<PathDoc>),
    Star(Box<PathDoc>),
}

/// Read a document from `path`, or from stdin for `None` and `-`.
pub fn load_document(path: Option<&FsPath>) -> Result<Document, DocumentError> {
    let text = match path {
        Some(path) if path.as_os_str() != "-" => {
            fs::read_to_string(path).map_err(|source| DocumentError::Read {
                path: path.display().to_string(),
                source,
            })?
        }
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|source| DocumentError::Read {
                    path: "<stdin>".to_string(),
                    source,
                })?;
            buf
        }
    };
    parse_document(&text)
}

pub fn parse_document(text: &str) -> Result<Document, DocumentError> {
    Ok(serde_json::from_str(text)?)
}

impl Document {
    /// Register every query in `session` and bind its hooks.
    pub fn build(&self, session: &mut Session) -> Result<(Vec<PathQuery>, Policy), DocumentError> {
        let forwarding = self.forwarding.to_policy()?;
        let mut queries = Vec::with_capacity(self.queries.len());
        for query in &self.queries {
            let path = query.path.build(session)?;
            queries.push(PathQuery::new(path, query.bucket));
        }
        Ok((queries, forwarding))
    }

    /// Compile in a fresh session. `tag_bits` overrides the document config.
    pub fn compile(&self, tag_bits: Option<u8>) -> Result<CompiledPolicy, DocumentError> {
        let mut config = self.config.clone();
        if let Some(bits) = tag_bits {
            config.tag_bits = bits;
        }
        let mut session = Session::with_config(config);
        let (queries, forwarding) = self.build(&mut session)?;
        tracing::debug!(queries = queries.len(), %forwarding, "document loaded");
        Ok(session.compile(&queries, &forwarding)?)
    }
}

impl PredDoc {
    pub fn to_pred(&self) -> Result<Pred, DocumentError> {
        match self {
            PredDoc::Identity => Ok(Pred::True),
            PredDoc::Drop => Ok(Pred::False),
            PredDoc::Match(tests) => {
                let mut out = Vec::with_capacity(tests.len());
                for (&field, json) in tests {
                    out.push((field, value(field, json)?));
                }
                Ok(Pred::tests(out))
            }
            PredDoc::And(preds) => {
                let mut acc = Pred::True;
                for pred in preds {
                    acc = acc.and(&pred.to_pred()?);
                }
                Ok(acc)
            }
            PredDoc::Or(preds) => {
                let mut acc = Pred::False;
                for pred in preds {
                    acc = acc.or(&pred.to_pred()?);
                }
                Ok(acc)
            }
            PredDoc::Not(inner) => Ok(!inner.to_pred()?),
        }
    }
}

impl PolicyDoc {
    pub fn to_policy(&self) -> Result<Policy, DocumentError> {
        match self {
            PolicyDoc::Identity => Ok(Policy::Identity),
            PolicyDoc::Drop => Ok(Policy::Drop),
            PolicyDoc::Filter(pred) => Ok(Policy::filter(pred.to_pred()?)),
            PolicyDoc::Modify(assignments) => {
                let mut acc = Policy::Identity;
                for (&field, json) in assignments {
                    acc = acc >> Policy::Modify(field, value(field, json)?);
                }
                Ok(acc)
            }
            PolicyDoc::Fwd(port) => Ok(Policy::fwd(*port)),
            PolicyDoc::Seq(stages) => {
                let mut acc = Policy::Identity;
                for stage in stages {
                    acc = acc >> stage.to_policy()?;
                }
                Ok(acc)
            }
            PolicyDoc::Par(branches) => {
                let mut acc = Policy::Drop;
                for branch in branches {
                    acc = acc + branch.to_policy()?;
                }
                Ok(acc)
            }
        }
    }
}

impl PathDoc {
    pub fn build(&self, session: &mut Session) -> Result<Path, DocumentError> {
        match self {
            PathDoc::Atom(pred) => Ok(session.atom(pred.to_pred()?)?),
            PathDoc::Hook {
                pred,
                fields,
                bucket,
            } => {
                let hook = session.hook(pred.to_pred()?, fields.iter().copied())?;
                session.bind_hook(&hook, *bucket);
                Ok(hook)
            }
            PathDoc::EndPath(pred) => Ok(session.end_path(pred.to_pred()?)?),
            PathDoc::Drop(pred) => Ok(session.drop_atom(pred.to_pred()?)?),
            PathDoc::Concat(parts) => chain(parts, session, "concat", |a, b| a ^ b),
            PathDoc::Alt(parts) => chain(parts, session, "alt", |a, b| a | b),
            PathDoc::Star(inner) => Ok(inner.build(session)?.star()),
        }
    }
}

fn chain(
    parts: &[PathDoc],
    session: &mut Session,
    name: &'static str,
    join: fn(Path, Path) -> Path,
) -> Result<Path, DocumentError> {
    let (first, rest) = parts
        .split_first()
        .ok_or(DocumentError::EmptyOperands(name))?;
    let mut acc = first.build(session)?;
    for part in rest {
        acc = join(acc, part.build(session)?);
    }
    Ok(acc)
}

fn value(field: Field, json: &Json) -> Result<Value, DocumentError> {
    let invalid = || DocumentError::InvalidValue {
        field,
        value: json.to_string(),
    };
    match json {
        Json::Null => Ok(Value::Unset),
        Json::Number(n) => n.as_u64().map(Value::Int).ok_or_else(invalid),
        Json::String(s) => s.parse().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}
