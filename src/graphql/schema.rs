use async_graphql::{EmptyMutation, EmptySubscription, Schema};

use super::queries::QueryRoot;

/// Read-only: every write goes through the HTML routes.
pub type BlogSchema = Schema<QueryRoot, EmptyMutation, EmptySubscription>;

/// Build the GraphQL schema
pub fn build_schema() -> BlogSchema {
    Schema::build(QueryRoot, EmptyMutation, EmptySubscription).finish()
}
