//! Attribute profiles.
//!
//! A profile turns the attributes one kind of identity source releases into
//! the fields of a local user. Sources differ only in attribute naming, so
//! each implementation is a plain function and all of them share the same
//! find-or-create logic in [`Authenticator`](crate::Authenticator).

use ssp_model::FederatedAttributeSet;

/// Local user fields read from a federated attribute set.
///
/// Every field is optional here; which ones are required is decided when
/// the user is found or created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserClaims {
    /// Email address.
    pub email: Option<String>,
    /// Account name.
    pub username: Option<String>,
    /// First name.
    pub first_name: Option<String>,
    /// Surname.
    pub surname: Option<String>,
}

/// Maps a federated attribute set to user claims.
pub type ClaimsMapper = fn(&FederatedAttributeSet) -> UserClaims;

/// Attribute names for one naming scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeProfile {
    /// Implementation identifier used in configuration.
    pub id: &'static str,
    /// Attribute carrying the email address.
    pub email: &'static str,
    /// Attribute carrying the account name.
    pub username: &'static str,
    /// Attribute carrying the first name.
    pub first_name: &'static str,
    /// Attribute carrying the surname.
    pub surname: &'static str,
}

impl AttributeProfile {
    /// Reads the first value of each mapped attribute.
    #[must_use]
    pub fn map(&self, attributes: &FederatedAttributeSet) -> UserClaims {
        let read = |name: &str| attributes.first(name).map(|v| v.trim().to_string());
        UserClaims {
            email: read(self.email),
            username: read(self.username),
            first_name: read(self.first_name),
            surname: read(self.surname),
        }
    }
}

/// WS-Federation / ADFS claim URIs.
pub const CLAIMS: AttributeProfile = AttributeProfile {
    id: "claims",
    email: "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress",
    username: "http://schemas.microsoft.com/ws/2008/06/identity/claims/windowsaccountname",
    first_name: "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/givenname",
    surname: "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/surname",
};

/// LDAP / Active Directory attribute names.
pub const DIRECTORY: AttributeProfile = AttributeProfile {
    id: "directory",
    email: "mail",
    username: "sAMAccountName",
    first_name: "givenName",
    surname: "sn",
};

/// Maps claim-URI attributes.
#[must_use]
pub fn claims_profile(attributes: &FederatedAttributeSet) -> UserClaims {
    CLAIMS.map(attributes)
}

/// Maps directory attributes.
#[must_use]
pub fn directory_profile(attributes: &FederatedAttributeSet) -> UserClaims {
    DIRECTORY.map(attributes)
}

/// Built-in implementations as `(id, mapper)` pairs.
#[must_use]
pub fn builtin() -> [(&'static str, ClaimsMapper); 2] {
    [
        (CLAIMS.id, claims_profile as ClaimsMapper),
        (DIRECTORY.id, directory_profile as ClaimsMapper),
    ]
}
