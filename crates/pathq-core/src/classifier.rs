//! Compilation of policies into prioritized rule tables.
//!
//! A [`Classifier`] is an ordered list of rules; the first rule whose
//! predicate matches a packet applies all of its actions. Every classifier
//! built here is total: its last rule matches every packet.

use std::collections::BTreeMap;
use std::fmt;

use crate::policy::Outcome;
use crate::{Capture, Field, Packet, Policy, Pred, Value};

/// Rewrite some fields, then forward the packet or hand it to a bucket.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Action {
    pub modify: BTreeMap<Field, Value>,
    pub capture: Option<Capture>,
}

impl Action {
    fn set(field: Field, value: Value) -> Self {
        Self {
            modify: BTreeMap::from([(field, value)]),
            capture: None,
        }
    }

    /// `self` followed by `next`.
    fn then(&self, next: &Action) -> Action {
        let mut modify = self.modify.clone();
        modify.extend(next.modify.iter().map(|(&f, &v)| (f, v)));
        Action {
            modify,
            capture: next.capture.clone(),
        }
    }

    fn apply(&self, pkt: &Packet, outcome: &mut Outcome) {
        let mut out = pkt.clone();
        for (&field, &value) in &self.modify {
            out.set(field, value);
        }
        match &self.capture {
            Some(capture) => {
                outcome.captured.insert((capture.bucket, capture.apply(&out)));
            }
            None => {
                outcome.forwarded.insert(out);
            }
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, value) in &self.modify {
            if !first {
                f.write_str(" >> ")?;
            }
            first = false;
            write!(f, "modify({field}={value})")?;
        }
        match &self.capture {
            Some(capture) if first => write!(f, "{capture}"),
            Some(capture) => write!(f, " >> {capture}"),
            None if first => f.write_str("identity"),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    pub pred: Pred,
    /// Empty means drop.
    pub actions: Vec<Action>,
}

impl Rule {
    fn new(pred: Pred, actions: Vec<Action>) -> Self {
        Self { pred, actions }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classifier {
    rules: Vec<Rule>,
}

impl Classifier {
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply the first matching rule.
    pub fn eval(&self, pkt: &Packet) -> Outcome {
        let mut outcome = Outcome::default();
        if let Some(rule) = self.rules.iter().find(|r| r.pred.eval(pkt)) {
            for action in &rule.actions {
                action.apply(pkt, &mut outcome);
            }
        }
        outcome
    }

    fn total(actions: Vec<Action>) -> Self {
        Self {
            rules: vec![Rule::new(Pred::True, actions)],
        }
    }

    /// Drop rules that can never fire.
    fn pruned(rules: Vec<Rule>) -> Self {
        let mut kept = Vec::with_capacity(rules.len());
        for rule in rules {
            if !rule.pred.is_satisfiable() {
                continue;
            }
            let last = rule.pred == Pred::True;
            kept.push(rule);
            if last {
                break;
            }
        }
        Self { rules: kept }
    }

    /// Both tables applied to every packet.
    fn par(&self, other: &Classifier) -> Classifier {
        let mut rules = Vec::with_capacity(self.rules.len() * other.rules.len());
        for r1 in &self.rules {
            for r2 in &other.rules {
                let mut actions = r1.actions.clone();
                for action in &r2.actions {
                    if !actions.contains(action) {
                        actions.push(action.clone());
                    }
                }
                rules.push(Rule::new(r1.pred.and(&r2.pred), actions));
            }
        }
        Classifier::pruned(rules)
    }

    /// `self` then `other` on every packet `self` forwards.
    fn seq(&self, other: &Classifier) -> Classifier {
        let mut rules = Vec::new();
        for r1 in &self.rules {
            if r1.actions.is_empty() {
                rules.push(r1.clone());
                continue;
            }
            let pulled = r1
                .actions
                .iter()
                .map(|action| other.pull_back(action))
                .reduce(|acc, c| acc.par(&c))
                .unwrap_or_else(|| Classifier::total(Vec::new()));
            for r2 in pulled.rules {
                rules.push(Rule::new(r1.pred.and(&r2.pred), r2.actions));
            }
        }
        Classifier::pruned(rules)
    }

    /// The table seen by packets that `action` produced, phrased over the
    /// packets before the action.
    fn pull_back(&self, action: &Action) -> Classifier {
        if action.capture.is_some() {
            return Classifier::total(vec![action.clone()]);
        }
        let rules = self
            .rules
            .iter()
            .map(|rule| {
                Rule::new(
                    rule.pred.restrict(&action.modify),
                    rule.actions.iter().map(|next| action.then(next)).collect(),
                )
            })
            .collect();
        Classifier::pruned(rules)
    }
}

impl fmt::Display for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            write!(f, "{} -> [", rule.pred)?;
            for (i, action) in rule.actions.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{action}")?;
            }
            f.write_str("]\n")?;
        }
        Ok(())
    }
}

impl Policy {
    /// Flatten the policy into a rule table that behaves identically.
    pub fn compile(&self) -> Classifier {
        match self {
            Policy::Identity => Classifier::total(vec![Action::default()]),
            Policy::Drop => Classifier::total(Vec::new()),
            Policy::Filter(pred) => Classifier::pruned(vec![
                Rule::new(pred.clone(), vec![Action::default()]),
                Rule::new(Pred::True, Vec::new()),
            ]),
            Policy::Modify(field, value) => Classifier::total(vec![Action::set(*field, *value)]),
            Policy::Fwd(port) => {
                Classifier::total(vec![Action::set(Field::OutPort, Value::Int(*port))])
            }
            Policy::Capture(capture) => Classifier::total(vec![Action {
                modify: BTreeMap::new(),
                capture: Some(capture.clone()),
            }]),
            Policy::Seq(stages) => stages
                .iter()
                .map(Policy::compile)
                .reduce(|acc, c| acc.seq(&c))
                .unwrap_or_else(|| Classifier::total(vec![Action::default()])),
            Policy::Par(branches) => branches
                .iter()
                .map(Policy::compile)
                .reduce(|acc, c| acc.par(&c))
                .unwrap_or_else(|| Classifier::total(Vec::new())),
        }
    }
}
