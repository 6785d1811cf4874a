pub mod sqlite_activity_repo;
pub mod sqlite_file_repo;
pub mod sqlite_invite_repo;
pub mod sqlite_qa_repo;
pub mod sqlite_user_repo;
