//! Pure update function for the store.
//!
//! `update` takes the model and a message, mutates the model and returns the
//! events subscribers should see. It performs no I/O beyond logging.

use crate::{llog, llog_debug, llog_warn};

use super::event::{Event, NodeField, Outcome};
use super::message::Message;
use super::model::{Activity, Model};

/// Mark the running operation as failed without emitting a finish event.
fn fail_in_place(model: &mut Model, message: String) {
    llog_warn!("store: {}", message);
    if let Some(operation) = model.activity.operation() {
        model.activity = Activity::Failed {
            operation,
            phase: None,
            message: message.clone(),
        };
    }
    model.progress.push(message);
}

/// Pure update function: Model + Message → Events
pub fn update(model: &mut Model, msg: Message) -> Vec<Event> {
    let mut events = Vec::new();

    match msg {
        Message::OperationStarted(operation) => {
            llog_debug!("store: OperationStarted {}", operation);
            model.progress.clear();
            model.activity = Activity::Running(operation);
            events.push(Event::OperationStarted { operation });
        }

        Message::Progress(line) => {
            model.progress.push(line.clone());
            events.push(Event::Progress { line });
        }

        Message::OperationSucceeded => {
            if let Some(operation) = model.activity.operation() {
                llog!("store: {} succeeded", operation);
                model.activity = Activity::Succeeded(operation);
                events.push(Event::OperationFinished {
                    operation,
                    outcome: Outcome::Succeeded,
                });
            }
        }

        Message::OperationCancelled => {
            if let Some(operation) = model.activity.operation() {
                llog!("store: {} cancelled", operation);
                model.activity = Activity::Cancelled(operation);
                events.push(Event::OperationFinished {
                    operation,
                    outcome: Outcome::Cancelled,
                });
            }
        }

        Message::OperationFailed { phase, message } => {
            if let Some(operation) = model.activity.operation() {
                llog_warn!("store: {} failed: {}", operation, message);
                model.activity = Activity::Failed {
                    operation,
                    phase,
                    message: message.clone(),
                };
                events.push(Event::OperationFinished {
                    operation,
                    outcome: Outcome::Failed { phase, message },
                });
            }
        }

        Message::NodeAppended(node) => {
            let (id, kind) = (node.id, node.kind());
            match model.graph.append(node) {
                Ok(_) => {
                    llog_debug!("store: appended {} node {}", kind, id.short());
                    events.push(Event::NodeAppended { id, kind });
                }
                Err(e) => fail_in_place(model, format!("Could not append node {}: {}", id.short(), e)),
            }
        }

        Message::ScoreUpdated(id, score) => match model.graph.set_score(&id, score) {
            Ok(()) => events.push(Event::NodeUpdated {
                id,
                field: NodeField::Score,
            }),
            Err(e) => fail_in_place(model, format!("Could not store score: {}", e)),
        },

        Message::SeoUpdated(id, seo) => match model.graph.set_seo(&id, seo) {
            Ok(()) => events.push(Event::NodeUpdated {
                id,
                field: NodeField::Seo,
            }),
            Err(e) => fail_in_place(model, format!("Could not store SEO metadata: {}", e)),
        },

        Message::GeoUpdated(id, geo) => match model.graph.set_geo(&id, geo) {
            Ok(()) => events.push(Event::NodeUpdated {
                id,
                field: NodeField::Geo,
            }),
            Err(e) => fail_in_place(model, format!("Could not store GEO score: {}", e)),
        },

        Message::InputsEvaluated(evaluation) => {
            events.push(Event::InputsEvaluated {
                score: evaluation.score,
            });
            model.evaluation = Some(evaluation);
        }

        Message::BriefLoaded(brief) => {
            model.brief = Some(brief);
        }

        Message::GraphReplaced(graph) => {
            llog!("store: graph replaced with {} nodes", graph.len());
            events.push(Event::GraphReplaced { nodes: graph.len() });
            model.graph = graph;
        }

        Message::Cleared => {
            llog!("store: session cleared");
            *model = Model::default();
            events.push(Event::Cleared);
        }
    }

    events
}
