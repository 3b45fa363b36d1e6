//! Comment row -> domain

use folio_core::{Comment, Snowflake};

use crate::models::CommentModel;

impl From<CommentModel> for Comment {
    fn from(model: CommentModel) -> Self {
        Comment {
            id: Snowflake::new(model.id),
            project_id: Snowflake::new(model.project_id),
            user_id: Snowflake::new(model.user_id),
            content: model.content,
            parent_comment_id: model.parent_comment_id.map(Snowflake::new),
            depth: model.depth,
            created_at: model.created_at,
            updated_at: model.updated_at,
            replies_count: model.replies_count,
            deleted: model.deleted,
        }
    }
}
