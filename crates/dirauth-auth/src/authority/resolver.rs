use crate::directory::{escape_filter_value, DirectorySession, SearchRequest};
use dirauth_core::config::{GroupFetchStrategy, SearchScope};
use dirauth_core::types::DirectoryEntry;
use dirauth_core::utils::{non_blank, rdn_value};
use dirauth_core::{AuthenticationProperties, DirectoryError, GROUP_MEMBER_USERNAME_PLACEHOLDER};
use std::collections::BTreeSet;
use tracing::debug;

/// Reads the raw group names of a user
#[derive(Debug, Clone)]
pub enum AuthorityResolver {
    None,
    /// Group DNs are listed on the user entry, e.g. in `memberOf`
    UserContainsGroups { member_attribute: String },
    /// Groups list their members and are searched for
    GroupContainsUsers(GroupSearch),
}

#[derive(Debug, Clone)]
pub struct GroupSearch {
    base_dn: String,
    scope: SearchScope,
    object_class: String,
    member_attribute: String,
    id_attribute: Option<String>,
    member_format: Option<String>,
    username_attribute: String,
}

impl AuthorityResolver {
    pub fn new(properties: &AuthenticationProperties) -> Self {
        match properties.group_fetch_strategy {
            GroupFetchStrategy::None => AuthorityResolver::None,
            GroupFetchStrategy::UserContainsGroups => AuthorityResolver::UserContainsGroups {
                member_attribute: properties.member_attribute.clone(),
            },
            GroupFetchStrategy::GroupContainsUsers => {
                AuthorityResolver::GroupContainsUsers(GroupSearch {
                    base_dn: properties.group_base_dn.clone().unwrap_or_default(),
                    scope: properties.group_search_scope,
                    object_class: properties.group_object_class.clone(),
                    member_attribute: properties.group_member_attribute.clone(),
                    id_attribute: properties.group_id_attribute_name().map(String::from),
                    member_format: properties.group_member_format_value().map(String::from),
                    username_attribute: properties.username_attribute.clone(),
                })
            }
        }
    }

    /// Raw role names for `user`, whose canonical name is `username`
    pub fn resolve(
        &self,
        user: &DirectoryEntry,
        username: &str,
        session: &mut dyn DirectorySession,
    ) -> Result<BTreeSet<String>, DirectoryError> {
        match self {
            AuthorityResolver::None => Ok(BTreeSet::new()),
            AuthorityResolver::UserContainsGroups { member_attribute } => Ok(user
                .values(member_attribute)
                .unwrap_or_default()
                .iter()
                .map(|dn| rdn_value(dn))
                .filter(|name| !name.trim().is_empty())
                .collect()),
            AuthorityResolver::GroupContainsUsers(search) => search.run(user, username, session),
        }
    }
}

impl GroupSearch {
    fn member_value(&self, user: &DirectoryEntry, username: &str) -> String {
        match &self.member_format {
            Some(format) => {
                let name = user
                    .first_value(&self.username_attribute)
                    .unwrap_or(username);
                format.replace(GROUP_MEMBER_USERNAME_PLACEHOLDER, name)
            }
            None => user.dn().to_string(),
        }
    }

    fn filter(&self, user: &DirectoryEntry, username: &str) -> String {
        format!(
            "(&(objectClass={})({}={}))",
            self.object_class,
            self.member_attribute,
            escape_filter_value(&self.member_value(user, username))
        )
    }

    fn run(
        &self,
        user: &DirectoryEntry,
        username: &str,
        session: &mut dyn DirectorySession,
    ) -> Result<BTreeSet<String>, DirectoryError> {
        let filter = self.filter(user, username);
        debug!("Searching groups under {} with filter: {}", self.base_dn, filter);

        let mut request = SearchRequest::new(&self.base_dn, self.scope, filter);
        if let Some(id) = &self.id_attribute {
            request = request.with_attributes([id.as_str()]);
        }

        let groups: BTreeSet<String> = session
            .search(&request)?
            .iter()
            .map(|group| {
                non_blank(self.id_attribute.as_deref().and_then(|id| group.first_value(id)))
                    .map(String::from)
                    .unwrap_or_else(|| group.rdn_value())
            })
            .filter(|name| !name.trim().is_empty())
            .collect();

        debug!("Found {} groups for {}", groups.len(), username);
        Ok(groups)
    }
}
