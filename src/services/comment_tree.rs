use crate::services::profile::AuthorSummary;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use utoipa::PartialSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNode {
    pub id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub author: AuthorSummary,
    pub content: String,
    pub content_html: String,
    pub upvote_count: u64,
    pub has_upvoted: bool,
    pub created_at: DateTime<Utc>,
    pub replies: Vec<CommentNode>,
}

impl utoipa::ToSchema for CommentNode {
    fn name() -> std::borrow::Cow<'static, str> {
        "CommentNode".into()
    }
}

impl utoipa::PartialSchema for CommentNode {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        use utoipa::openapi::schema::{
            ArrayBuilder, KnownFormat, ObjectBuilder, Schema, SchemaFormat, Type,
        };
        use utoipa::openapi::{Ref, RefOr};
        let formatted = |format: KnownFormat| -> RefOr<Schema> {
            RefOr::T(Schema::Object(
                ObjectBuilder::new()
                    .schema_type(Type::String)
                    .format(Some(SchemaFormat::KnownFormat(format)))
                    .build(),
            ))
        };
        let mut builder = ObjectBuilder::new()
            .schema_type(Type::Object)
            .property("id", formatted(KnownFormat::Uuid))
            .property("postId", formatted(KnownFormat::Uuid))
            .property("parentId", Option::<String>::schema())
            .property("author", Ref::from_schema_name("AuthorSummary"))
            .property("content", String::schema())
            .property("contentHtml", String::schema())
            .property("upvoteCount", u64::schema())
            .property("hasUpvoted", bool::schema())
            .property("createdAt", formatted(KnownFormat::DateTime))
            .property(
                "replies",
                ArrayBuilder::new()
                    .items(Ref::from_schema_name("CommentNode"))
                    .build(),
            );
        for field in [
            "id",
            "postId",
            "author",
            "content",
            "contentHtml",
            "upvoteCount",
            "hasUpvoted",
            "createdAt",
            "replies",
        ] {
            builder = builder.required(field);
        }
        RefOr::T(Schema::Object(builder.build()))
    }
}

/// Nest a flat, time-ordered comment list under parents.
///
/// Children keep input order. A comment whose parent is missing becomes a
/// root, and so does anything left unattached (parent cycles), so every
/// input node appears exactly once in the output.
pub fn build_tree(comments: Vec<CommentNode>) -> Vec<CommentNode> {
    let ids: HashSet<Uuid> = comments.iter().map(|c| c.id).collect();
    let mut order: Vec<Uuid> = Vec::with_capacity(comments.len());
    let mut children_map: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    let mut root_ids: Vec<Uuid> = Vec::new();
    let mut nodes: HashMap<Uuid, CommentNode> = HashMap::with_capacity(comments.len());

    for mut comment in comments {
        if nodes.contains_key(&comment.id) {
            continue;
        }
        comment.replies.clear();
        match comment.parent_id {
            Some(parent) if parent != comment.id && ids.contains(&parent) => {
                children_map.entry(parent).or_default().push(comment.id);
            }
            _ => root_ids.push(comment.id),
        }
        order.push(comment.id);
        nodes.insert(comment.id, comment);
    }

    fn attach_children(
        node_id: Uuid,
        nodes: &mut HashMap<Uuid, CommentNode>,
        children_map: &HashMap<Uuid, Vec<Uuid>>,
    ) -> Option<CommentNode> {
        let mut node = nodes.remove(&node_id)?;
        if let Some(child_ids) = children_map.get(&node_id) {
            for &child_id in child_ids {
                if let Some(child) = attach_children(child_id, nodes, children_map) {
                    node.replies.push(child);
                }
            }
        }
        Some(node)
    }

    let mut roots: Vec<CommentNode> = root_ids
        .into_iter()
        .filter_map(|id| attach_children(id, &mut nodes, &children_map))
        .collect();

    // Whatever is left only points at itself through a cycle.
    for id in order {
        if nodes.contains_key(&id) {
            if let Some(mut node) = attach_children(id, &mut nodes, &children_map) {
                node.parent_id = None;
                roots.push(node);
            }
        }
    }

    roots
}

/// Pre-order walk back to a flat list with empty `replies`.
pub fn flatten(tree: &[CommentNode]) -> Vec<CommentNode> {
    let mut out = Vec::new();
    let mut stack: Vec<&CommentNode> = tree.iter().rev().collect();
    while let Some(node) = stack.pop() {
        let mut flat = node.clone();
        flat.replies = Vec::new();
        out.push(flat);
        stack.extend(node.replies.iter().rev());
    }
    out
}
