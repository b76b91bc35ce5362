pub mod forum_comment;
pub mod forum_post;
pub mod profile;
pub mod vote;

pub use forum_comment::{Entity as ForumComment, Model as ForumCommentModel};
pub use forum_post::{Entity as ForumPost, Model as ForumPostModel};
pub use profile::{Entity as Profile, Model as ProfileModel};
pub use vote::{Entity as Vote, Model as VoteModel};
