mod table;
mod tenant;

pub use table::{MAX_IDENTIFIER_LENGTH, TableName, TableNameError};
pub use tenant::{Tenant, TenantContext, TenantId};
