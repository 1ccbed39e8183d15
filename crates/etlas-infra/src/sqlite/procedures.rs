//! SQL bodies for every named procedure the repositories call.
//!
//! Placeholders are numbered (`?1`, `?2`, ...) after the procedure's declared
//! parameter order. List procedures attach the unpaged row count as a
//! `total_count` column. The count is computed apart from the page, so a page
//! past the end still yields one row: all entity columns null, count set.

/// Which side of the [`super::pool::DatabasePool`] a procedure runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// A procedure name bound to the SQL that implements it.
#[derive(Debug, Clone, Copy)]
pub struct ProcedureBinding {
    pub name: &'static str,
    pub params: &'static [&'static str],
    pub sql: &'static str,
    pub access: Access,
}

const fn read(
    name: &'static str,
    params: &'static [&'static str],
    sql: &'static str,
) -> ProcedureBinding {
    ProcedureBinding {
        name,
        params,
        sql,
        access: Access::Read,
    }
}

const fn write(
    name: &'static str,
    params: &'static [&'static str],
    sql: &'static str,
) -> ProcedureBinding {
    ProcedureBinding {
        name,
        params,
        sql,
        access: Access::Write,
    }
}

macro_rules! user_columns {
    () => {
        "id, name, email, email_verified, image, created_at"
    };
}

macro_rules! scheme_columns {
    () => {
        "s.id, s.user_id, s.title, s.content, s.attachment_url, s.created_at"
    };
}

macro_rules! chat_columns {
    () => {
        "c.id, c.user_id, c.scheme_id, c.name_chat, c.created_at"
    };
}

macro_rules! message_columns {
    () => {
        "m.id, m.chat_id, m.role, m.content, m.content_analysis, m.content_comment, \
         m.content_code, m.content_executable_code, m.created_at"
    };
}

macro_rules! attachment_columns {
    () => {
        "a.id, a.message_id, a.url, a.filename, a.created_at"
    };
}

/// Row-order column of paged queries. The store drops it from records.
pub const PAGE_SEQ: &str = "page_seq";

/// Paged select over `from`: counts every matching row, then left-joins the
/// requested window onto that count.
macro_rules! paged {
    (
        $columns:ident,
        from: $from:literal,
        order: $order:literal,
        seq: $seq:literal,
        limit: $limit:literal,
        offset: $offset:literal $(,)?
    ) => {
        concat!(
            "SELECT p.*, t.total_count FROM (SELECT COUNT(*) AS total_count ",
            $from,
            ") t LEFT JOIN (SELECT ",
            $columns!(),
            ", ",
            $seq,
            " AS page_seq ",
            $from,
            " ORDER BY ",
            $order,
            " LIMIT ",
            $limit,
            " OFFSET ",
            $offset,
            ") p ON 1 ORDER BY p.created_at, p.page_seq"
        )
    };
}

pub const USERS: &[ProcedureBinding] = &[
    read(
        "get_user_by_id",
        &["id"],
        concat!("SELECT ", user_columns!(), " FROM users WHERE id = ?1"),
    ),
    read(
        "get_all_users",
        &["limit", "skip"],
        paged!(
            user_columns,
            from: "FROM users",
            order: "created_at, rowid",
            seq: "rowid",
            limit: "?1",
            offset: "?2",
        ),
    ),
    write(
        "create_user",
        &["name", "email", "email_verified", "image"],
        "INSERT INTO users (name, email, email_verified, image) \
         VALUES (?1, ?2, ?3, ?4) RETURNING id, created_at",
    ),
    write(
        "update_user",
        &["id", "name", "email", "email_verified", "image"],
        "UPDATE users SET name = COALESCE(?2, name), email = COALESCE(?3, email), \
         email_verified = COALESCE(?4, email_verified), image = COALESCE(?5, image) \
         WHERE id = ?1 RETURNING id",
    ),
    write(
        "delete_user",
        &["id"],
        "DELETE FROM users WHERE id = ?1 RETURNING id",
    ),
    read(
        "get_user_by_email",
        &["email"],
        concat!("SELECT ", user_columns!(), " FROM users WHERE email = ?1"),
    ),
];

pub const SCHEMES: &[ProcedureBinding] = &[
    read(
        "get_scheme_by_id",
        &["id"],
        concat!("SELECT ", scheme_columns!(), " FROM schemes s WHERE s.id = ?1"),
    ),
    read(
        "get_all_schemes",
        &["limit", "skip"],
        paged!(
            scheme_columns,
            from: "FROM schemes s",
            order: "s.created_at, s.rowid",
            seq: "s.rowid",
            limit: "?1",
            offset: "?2",
        ),
    ),
    write(
        "create_scheme",
        &["title", "content", "user_id", "attachment_url"],
        "INSERT INTO schemes (title, content, user_id, attachment_url) \
         VALUES (?1, ?2, ?3, ?4) RETURNING id, created_at",
    ),
    write(
        "update_scheme",
        &["id", "title", "content", "attachment_url"],
        "UPDATE schemes SET title = COALESCE(?2, title), content = COALESCE(?3, content), \
         attachment_url = COALESCE(?4, attachment_url) WHERE id = ?1 RETURNING id",
    ),
    write(
        "delete_scheme",
        &["id"],
        "DELETE FROM schemes WHERE id = ?1 RETURNING id",
    ),
    read(
        "get_all_schemes_by_user_id",
        &["user_id"],
        concat!(
            "SELECT ",
            scheme_columns!(),
            " FROM schemes s WHERE s.user_id = ?1 ORDER BY s.created_at, s.rowid"
        ),
    ),
    read(
        "get_all_schemes_by_chat_id",
        &["chat_id", "limit", "skip"],
        paged!(
            scheme_columns,
            from: "FROM schemes s JOIN chats c ON c.scheme_id = s.id WHERE c.id = ?1",
            order: "s.created_at, s.rowid",
            seq: "s.rowid",
            limit: "?2",
            offset: "?3",
        ),
    ),
];

pub const CHATS: &[ProcedureBinding] = &[
    read(
        "get_chat_by_id",
        &["id"],
        concat!("SELECT ", chat_columns!(), " FROM chats c WHERE c.id = ?1"),
    ),
    read(
        "get_all_chats",
        &["limit", "skip"],
        paged!(
            chat_columns,
            from: "FROM chats c",
            order: "c.created_at, c.rowid",
            seq: "c.rowid",
            limit: "?1",
            offset: "?2",
        ),
    ),
    write(
        "create_chat",
        &["user_id", "scheme_id", "name_chat"],
        "INSERT INTO chats (user_id, scheme_id, name_chat) \
         VALUES (?1, ?2, ?3) RETURNING id, created_at",
    ),
    write(
        "update_chat",
        &["id", "user_id", "scheme_id", "name_chat"],
        "UPDATE chats SET user_id = COALESCE(?2, user_id), scheme_id = COALESCE(?3, scheme_id), \
         name_chat = COALESCE(?4, name_chat) WHERE id = ?1 RETURNING id",
    ),
    write(
        "delete_chat",
        &["id"],
        "DELETE FROM chats WHERE id = ?1 RETURNING id",
    ),
    read(
        "get_all_chats_by_user_id",
        &["user_id", "limit", "skip"],
        paged!(
            chat_columns,
            from: "FROM chats c WHERE c.user_id = ?1",
            order: "c.created_at, c.rowid",
            seq: "c.rowid",
            limit: "?2",
            offset: "?3",
        ),
    ),
    read(
        "get_all_chats_by_scheme_id",
        &["scheme_id", "limit", "skip"],
        paged!(
            chat_columns,
            from: "FROM chats c WHERE c.scheme_id = ?1",
            order: "c.created_at, c.rowid",
            seq: "c.rowid",
            limit: "?2",
            offset: "?3",
        ),
    ),
];

pub const MESSAGES: &[ProcedureBinding] = &[
    read(
        "get_message_by_id",
        &["id"],
        concat!("SELECT ", message_columns!(), " FROM messages m WHERE m.id = ?1"),
    ),
    read(
        "get_all_messages",
        &["limit", "skip"],
        paged!(
            message_columns,
            from: "FROM messages m",
            order: "m.created_at, m.rowid",
            seq: "m.rowid",
            limit: "?1",
            offset: "?2",
        ),
    ),
    write(
        "create_message",
        &[
            "chat_id",
            "role",
            "content",
            "content_analysis",
            "content_comment",
            "content_code",
            "content_executable_code",
        ],
        "INSERT INTO messages (chat_id, role, content, content_analysis, content_comment, \
         content_code, content_executable_code) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
         RETURNING id, created_at",
    ),
    write(
        "update_message",
        &[
            "id",
            "content_analysis",
            "content_comment",
            "content_code",
            "content_executable_code",
        ],
        "UPDATE messages SET content_analysis = COALESCE(?2, content_analysis), \
         content_comment = COALESCE(?3, content_comment), \
         content_code = COALESCE(?4, content_code), \
         content_executable_code = COALESCE(?5, content_executable_code) \
         WHERE id = ?1 RETURNING id",
    ),
    write(
        "delete_message",
        &["id"],
        "DELETE FROM messages WHERE id = ?1 RETURNING id",
    ),
    read(
        "get_all_messages_by_user_id",
        &["user_id"],
        concat!(
            "SELECT ",
            message_columns!(),
            " FROM messages m JOIN chats c ON c.id = m.chat_id WHERE c.user_id = ?1 \
             ORDER BY m.created_at, m.rowid"
        ),
    ),
    read(
        "get_all_messages_with_attachments_by_chat_id",
        &["chat_id", "limit", "skip"],
        paged!(
            message_columns,
            from: "FROM messages m WHERE m.chat_id = ?1",
            order: "m.created_at, m.rowid",
            seq: "m.rowid",
            limit: "?2",
            offset: "?3",
        ),
    ),
    read(
        "get_full_messages_by_chat_id",
        &["chat_id"],
        concat!(
            "SELECT ",
            message_columns!(),
            " FROM messages m WHERE m.chat_id = ?1 ORDER BY m.created_at, m.rowid"
        ),
    ),
];

pub const ATTACHMENTS: &[ProcedureBinding] = &[
    read(
        "get_attachment_by_id",
        &["id"],
        concat!("SELECT ", attachment_columns!(), " FROM attachments a WHERE a.id = ?1"),
    ),
    read(
        "get_all_attachments",
        &["limit", "skip"],
        paged!(
            attachment_columns,
            from: "FROM attachments a",
            order: "a.created_at, a.rowid",
            seq: "a.rowid",
            limit: "?1",
            offset: "?2",
        ),
    ),
    write(
        "create_attachment",
        &["message_id", "url", "filename"],
        "INSERT INTO attachments (message_id, url, filename) VALUES (?1, ?2, ?3) \
         RETURNING id, created_at",
    ),
    write(
        "update_attachment",
        &["id", "url", "filename"],
        "UPDATE attachments SET url = COALESCE(?2, url), filename = COALESCE(?3, filename) \
         WHERE id = ?1 RETURNING id",
    ),
    write(
        "delete_attachment",
        &["id"],
        "DELETE FROM attachments WHERE id = ?1 RETURNING id",
    ),
    read(
        "get_all_attachments_by_message_id",
        &["message_id"],
        concat!(
            "SELECT ",
            attachment_columns!(),
            " FROM attachments a WHERE a.message_id = ?1 ORDER BY a.created_at, a.rowid"
        ),
    ),
    read(
        "get_all_attachments_by_message_ids",
        &["message_ids"],
        concat!(
            "SELECT ",
            attachment_columns!(),
            " FROM attachments a WHERE a.message_id IN (SELECT value FROM json_each(?1)) \
             ORDER BY a.created_at, a.rowid"
        ),
    ),
];

/// Every binding shipped with the SQLite store.
pub fn all() -> impl Iterator<Item = &'static ProcedureBinding> {
    USERS
        .iter()
        .chain(SCHEMES)
        .chain(CHATS)
        .chain(MESSAGES)
        .chain(ATTACHMENTS)
}
