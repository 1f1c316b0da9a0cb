//! Exit codes the handler reports to the hosting agent.
//!
//! These values are a contract with the extension platform and with the
//! onboarding script; they are not free to change.

/// Operation completed.
pub const SUCCESS: i32 = 0;

/// Generic failure with no more specific code.
pub const GENERIC_FAILURE: i32 = 1;

/// Onboarding service answered 403; agent id and certificate should be regenerated.
pub const ONBOARD_FORBIDDEN: i32 = 5;

/// Onboarding service answered with some other non-200 status.
pub const ONBOARD_NON_200: i32 = 6;

/// Onboarding script could not resolve the service host.
pub const HOST_UNRESOLVABLE: i32 = 7;

/// Host already reports elsewhere and multiple connections were refused.
pub const MULTIPLE_CONNECTIONS: i32 = 10;

/// A required setting was absent.
pub const MISSING_PARAMETER: i32 = 11;

/// A setting was present but malformed.
pub const INVALID_PARAMETER: i32 = 11;

/// Package manager still locked after all retries.
pub const PACKAGE_MANAGER_LOCKED: i32 = 12;

/// Enable was requested before the onboarding script was installed.
pub const ENABLE_BEFORE_INSTALL: i32 = 20;

/// Host distribution or version is not on the whitelist.
pub const UNSUPPORTED_OS: i32 = 51;

/// Service unreachable: no internet access, bad proxy or wrong workspace id.
pub const NO_INTERNET: i32 = 55;

/// `openssl` command line tool is not available.
pub const UNSUPPORTED_OPENSSL: i32 = 60;

/// Bundle reported that curl is not installed.
pub const CURL_NOT_INSTALLED: i32 = 64;

/// The command could not be spawned at all.
pub const COULD_NOT_EXECUTE: i32 = 127;
