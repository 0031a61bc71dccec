//! Route groups mounted under the API prefix.
//!
//! Each group is a `Router<AppState>` with paths relative to the prefix.
//! Groups must not define the same path and method twice: axum rejects
//! overlapping routes when they are merged.

use axum::Router;

use crate::state::AppState;

pub mod api;
pub mod chatbot;
pub mod optimizer;
pub mod reports;
pub mod streaming;

/// A named route group.
#[derive(Debug)]
pub struct RouteGroup {
    /// Group name, used in startup logs.
    pub name: &'static str,
    /// Routes relative to the API prefix.
    pub router: Router<AppState>,
}

impl RouteGroup {
    /// Create a group.
    pub fn new(name: &'static str, router: Router<AppState>) -> Self {
        Self { name, router }
    }
}

/// All route groups in mount order.
pub fn route_groups() -> Vec<RouteGroup> {
    vec![
        RouteGroup::new("api", api::router()),
        RouteGroup::new("streaming", streaming::router()),
        RouteGroup::new("reports", reports::router()),
        RouteGroup::new("chatbot", chatbot::router()),
        RouteGroup::new("optimizer", optimizer::router()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_are_listed_in_mount_order() {
        let names: Vec<&str> = route_groups().iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["api", "streaming", "reports", "chatbot", "optimizer"]);
    }
}
