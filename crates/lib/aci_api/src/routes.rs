//! Route paths.

pub const GET_HEALTH: &str = "/health";

pub const POST_AUTH_LOGIN: &str = "/auth/login";
pub const POST_AUTH_REFRESH: &str = "/auth/refresh";
pub const POST_AUTH_RESET_PASSWORD: &str = "/auth/reset-password";
pub const POST_AUTH_LOGOUT: &str = "/auth/logout";

pub const GET_USERS_ME: &str = "/users/me";
pub const GET_USERS_ME_ROLES: &str = "/users/me/roles";
pub const GET_USERS_ME_TOOLS: &str = "/users/me/tools";

pub const GET_TOOLS: &str = "/tools";
pub const GET_TOOLS_ID: &str = "/tools/{id}";
pub const GET_TOOLS_COMPARE_ACCESS: &str = "/tools/compare/access";

pub const ADMIN_USERS: &str = "/admin/users";
pub const ADMIN_USERS_ID: &str = "/admin/users/{id}";
pub const ADMIN_ROLES: &str = "/admin/roles";
pub const ADMIN_ROLES_ID: &str = "/admin/roles/{id}";
pub const POST_ADMIN_ROLES_RENAME: &str = "/admin/roles/rename";
pub const ADMIN_TOOLS: &str = "/admin/tools";
pub const ADMIN_TOOLS_ID: &str = "/admin/tools/{id}";

/// Tool that gates the comparison endpoint.
pub const COMPARE_TOOL: &str = "compare_tool";
