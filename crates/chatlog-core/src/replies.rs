//! `message_replies`: how many non-empty replies each message received.

use crate::storage::schema::MESSAGE_REPLIES_DDL;
use anyhow::Context;
use rusqlite::Connection;

/// Every distinct message id gets a row, messages nobody answered count 0.
/// Replies whose target is not in `answer` are dropped, as are replies with
/// NULL or empty text.
const EXTRACT_MESSAGE_REPLIES: &str = r#"
WITH unique_ids AS (
    SELECT DISTINCT message_id FROM answer WHERE message_id IS NOT NULL
)
INSERT INTO message_replies(message_id, replies_count)
SELECT unique_ids.message_id, COUNT(replies.reply_to_msg_id)
FROM unique_ids
LEFT JOIN answer AS replies
    ON replies.reply_to_msg_id = unique_ids.message_id
   AND replies.text IS NOT NULL
   AND replies.text != ''
GROUP BY unique_ids.message_id
"#;

pub fn create_message_replies_table(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(MESSAGE_REPLIES_DDL)
        .context("failed to create message_replies table")
}

/// Returns the number of rows written.
pub fn extract_message_replies(conn: &Connection) -> anyhow::Result<usize> {
    let n = conn
        .execute(EXTRACT_MESSAGE_REPLIES, [])
        .context("failed to extract message replies")?;
    tracing::debug!(event = "message_replies_extracted", rows = n);
    Ok(n)
}
