//! uid/gid resolution for the local driver

use tracing::warn;

use crate::drivers::error::{DriverError, Result};
use crate::types::IdSpec;

/// Resolve an owner to a uid, consulting the user database only for names
pub fn resolve_user(owner: &IdSpec) -> Result<u32> {
    if let Some(uid) = owner.numeric() {
        return Ok(uid);
    }

    warn!(
        "uids should be preferred over usernames to ensure correct operation on \
         systems where the user does not exist, got: {owner}"
    );

    uid_by_username(&owner.to_string()).ok_or_else(|| DriverError::AttributeResolution {
        kind: "user",
        name: owner.to_string(),
    })
}

/// Resolve a group to a gid, consulting the group database only for names
pub fn resolve_group(group: &IdSpec) -> Result<u32> {
    if let Some(gid) = group.numeric() {
        return Ok(gid);
    }

    warn!(
        "gids should be preferred over group names to ensure correct operation on \
         systems where the group does not exist, got: {group}"
    );

    gid_by_groupname(&group.to_string()).ok_or_else(|| DriverError::AttributeResolution {
        kind: "group",
        name: group.to_string(),
    })
}

#[cfg(unix)]
fn uid_by_username(username: &str) -> Option<u32> {
    nix::unistd::User::from_name(username)
        .ok()
        .flatten()
        .map(|user| user.uid.as_raw())
}

#[cfg(unix)]
fn gid_by_groupname(groupname: &str) -> Option<u32> {
    nix::unistd::Group::from_name(groupname)
        .ok()
        .flatten()
        .map(|group| group.gid.as_raw())
}

#[cfg(not(unix))]
fn uid_by_username(_username: &str) -> Option<u32> {
    None
}

#[cfg(not(unix))]
fn gid_by_groupname(_groupname: &str) -> Option<u32> {
    None
}
