//! Reserved field names and well-known identities.
//!
//! Lists and items share one flat collection, so these names are part of
//! the persisted layout and must not change.

/// Document id.
pub const ID_FIELD: &str = "_id";

/// Reference from an item (or child list) to its owning list.
pub const LIST_REF_FIELD: &str = "listid";

/// Schema text of a list. Its presence marks a document as a list.
pub const SCHEMA_FIELD: &str = "schema";

/// Identity that created a list.
pub const OWNER_FIELD: &str = "owner";

/// Optional display name of a list.
pub const NAME_FIELD: &str = "name";

pub const CONF_PERM_FIELD: &str = "confperm";
pub const WRITE_PERM_FIELD: &str = "writeperm";
pub const READ_PERM_FIELD: &str = "readperm";

/// Envelope key carrying a batch of item payloads on create.
pub const BATCH_FIELD: &str = "_items";

/// Permission token granting every identity.
pub const PERM_ALL: &str = "@all";

/// Permission token granting nobody but the list owner.
pub const PERM_LIST_OWNER: &str = "@listowner";

/// Default administrator identity.
pub const DEFAULT_ADMIN_IDENTITY: &str = "admin";

/// Default identity of unauthenticated callers.
pub const DEFAULT_ANONYMOUS_IDENTITY: &str = "@anonymous";
