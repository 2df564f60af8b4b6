use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::status::OrderStatus;

/// Who is asking for a transition. API callers (customers and admins) may only
/// cancel; the saga orchestrator drives the full fulfillment pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionSource {
    Api,
    Saga,
}

/// Typed rejection of a requested transition. Never a panic: the API path maps
/// these to a conflict response, the consumer path logs and drops the event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionRejection {
    #[error("order is already in terminal status {0}")]
    Terminal(OrderStatus),

    #[error("no transition from {from} to {to}")]
    IllegalEdge { from: OrderStatus, to: OrderStatus },

    #[error("status {to} cannot be requested through the api")]
    SourceNotPermitted { to: OrderStatus },
}

/// Decide whether `requested` is reachable from `current` for the given source.
///
/// Pure and stateless: the decision is a function of the two statuses and the
/// source alone, which keeps the adjacency table exhaustively testable.
pub fn validate(
    current: OrderStatus,
    requested: OrderStatus,
    source: TransitionSource,
) -> Result<(), TransitionRejection> {
    if current.is_terminal() {
        return Err(TransitionRejection::Terminal(current));
    }

    if source == TransitionSource::Api && requested != OrderStatus::Cancelled {
        return Err(TransitionRejection::SourceNotPermitted { to: requested });
    }

    let legal = matches!(
        (current, requested),
        (OrderStatus::Pending, OrderStatus::Confirmed)
            | (OrderStatus::Confirmed, OrderStatus::Processing)
            | (OrderStatus::Processing, OrderStatus::Shipped)
            | (OrderStatus::Shipped, OrderStatus::Delivered)
            | (
                OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Processing,
                OrderStatus::Cancelled | OrderStatus::Failed,
            )
    );

    if legal {
        Ok(())
    } else {
        Err(TransitionRejection::IllegalEdge {
            from: current,
            to: requested,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    /// The documented adjacency table, independent of source restrictions.
    fn edge_exists(from: OrderStatus, to: OrderStatus) -> bool {
        matches!(
            (from, to),
            (Pending, Confirmed)
                | (Confirmed, Processing)
                | (Processing, Shipped)
                | (Shipped, Delivered)
                | (Pending | Confirmed | Processing, Cancelled)
                | (Pending | Confirmed | Processing, Failed)
        )
    }

    #[test]
    fn test_saga_source_matches_adjacency_table() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let result = validate(from, to, TransitionSource::Saga);
                if from.is_terminal() {
                    assert_eq!(result, Err(TransitionRejection::Terminal(from)));
                } else if edge_exists(from, to) {
                    assert_eq!(result, Ok(()), "expected {from} -> {to} to be legal");
                } else {
                    assert_eq!(
                        result,
                        Err(TransitionRejection::IllegalEdge { from, to }),
                        "expected {from} -> {to} to be rejected"
                    );
                }
            }
        }
    }

    #[test]
    fn test_api_source_only_cancels() {
        for from in OrderStatus::ALL {
            for to in OrderStatus::ALL {
                let result = validate(from, to, TransitionSource::Api);
                if from.is_terminal() {
                    assert_eq!(result, Err(TransitionRejection::Terminal(from)));
                } else if to != Cancelled {
                    assert_eq!(
                        result,
                        Err(TransitionRejection::SourceNotPermitted { to }),
                        "api must not drive {from} -> {to}"
                    );
                } else if edge_exists(from, to) {
                    assert_eq!(result, Ok(()));
                } else {
                    assert_eq!(result, Err(TransitionRejection::IllegalEdge { from, to }));
                }
            }
        }
    }

    #[test]
    fn test_no_exit_from_terminal_states() {
        for from in [Delivered, Cancelled, Failed] {
            for to in OrderStatus::ALL {
                for source in [TransitionSource::Api, TransitionSource::Saga] {
                    assert_eq!(
                        validate(from, to, source),
                        Err(TransitionRejection::Terminal(from))
                    );
                }
            }
        }
    }

    #[test]
    fn test_no_skipping_pipeline_stages() {
        assert_eq!(
            validate(Pending, Delivered, TransitionSource::Saga),
            Err(TransitionRejection::IllegalEdge {
                from: Pending,
                to: Delivered
            })
        );
        assert_eq!(
            validate(Pending, Shipped, TransitionSource::Saga),
            Err(TransitionRejection::IllegalEdge {
                from: Pending,
                to: Shipped
            })
        );
    }

    #[test]
    fn test_cancel_not_reachable_from_shipped() {
        assert_eq!(
            validate(Shipped, Cancelled, TransitionSource::Api),
            Err(TransitionRejection::IllegalEdge {
                from: Shipped,
                to: Cancelled
            })
        );
    }
}
