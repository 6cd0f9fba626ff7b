//! Capability providers: the bounded functions a script may call.
//!
//! Providers form a closed set composed by the context builder at
//! construction time; there is no global registry to mutate. Every
//! capability degrades silently when abused - a call cap exceeded or a
//! duplicate DM turns the function into a no-op, never an error the
//! script could observe or the host could crash on.

use std::sync::{Arc, Mutex};

use mlua::{Lua, Value, Variadic};
use tracing::warn;

use herald_core::{BotUser, Guild, Member, RoleId};

use crate::context::RenderState;
use crate::error::Result;
use crate::outbound::Outbound;

/// How many times `mentionRoleID`/`mentionRoleName` may each be called.
pub const MAX_MENTION_ROLE_CALLS: u32 = 50;

/// Hard cap on distinct roles recorded for mentioning.
pub const MAX_MENTION_ROLES: usize = 50;

/// How many times `hasRoleID`/`hasRoleName` may each be called.
pub const MAX_HAS_ROLE_CALLS: u32 = 100;

/// Everything a provider needs to install bindings into a context.
pub struct BindingCtx<'a> {
    pub(crate) lua: &'a Lua,
    pub(crate) bot: &'a BotUser,
    pub(crate) guild: &'a Arc<Guild>,
    pub(crate) member: &'a Arc<Member>,
    pub(crate) outbound: &'a Arc<dyn Outbound>,
    pub(crate) state: &'a Arc<Mutex<RenderState>>,
}

impl BindingCtx<'_> {
    /// The Lua engine being bound into.
    pub fn lua(&self) -> &Lua {
        self.lua
    }

    /// The bot identity of this context.
    pub fn bot(&self) -> &BotUser {
        self.bot
    }

    /// The guild snapshot of this context.
    pub fn guild(&self) -> &Guild {
        self.guild
    }

    /// The invoking member.
    pub fn member(&self) -> &Member {
        self.member
    }
}

/// Contributes function bindings to a script context.
///
/// The builder composes an ordered list of providers; each contributes its
/// bindings exactly once, before any data is bound.
pub trait CapabilityProvider: Send + Sync {
    fn bind(&self, ctx: &BindingCtx<'_>) -> Result<()>;
}

/// The default capability set: DM delivery, mention gating, and role
/// membership checks.
#[derive(Debug, Default, Clone, Copy)]
pub struct BaseCapabilities;

impl CapabilityProvider for BaseCapabilities {
    fn bind(&self, ctx: &BindingCtx<'_>) -> Result<()> {
        let globals = ctx.lua.globals();

        // sendDM(text...) - at most one DM per context lifetime.
        {
            let guild = Arc::clone(ctx.guild);
            let member = Arc::clone(ctx.member);
            let outbound = Arc::clone(ctx.outbound);
            let state = Arc::clone(ctx.state);
            let f = ctx.lua.create_function(move |_, parts: Variadic<String>| {
                let Ok(mut st) = state.lock() else {
                    return Ok(String::new());
                };
                if st.sent_dm {
                    return Ok(String::new());
                }
                st.sent_dm = true;
                drop(st);

                let msg = format!(
                    "Custom command DM from the server **{}**:\n{}",
                    guild.name,
                    parts.join("")
                );
                if let Err(e) = outbound.deliver_dm(member.user_id, &msg) {
                    warn!(user = %member.user_id, error = %e, "DM delivery failed");
                }
                Ok(String::new())
            })?;
            globals.set("sendDM", f)?;
        }

        // mentionEveryone() / mentionHere() - sticky flags for the sanitizer.
        {
            let state = Arc::clone(ctx.state);
            let f = ctx.lua.create_function(move |_, ()| {
                if let Ok(mut st) = state.lock() {
                    st.mention_everyone = true;
                }
                Ok(" @everyone ")
            })?;
            globals.set("mentionEveryone", f)?;
        }
        {
            let state = Arc::clone(ctx.state);
            let f = ctx.lua.create_function(move |_, ()| {
                if let Ok(mut st) = state.lock() {
                    st.mention_here = true;
                }
                Ok(" @here ")
            })?;
            globals.set("mentionHere", f)?;
        }

        // mentionRoleID(id) / mentionRoleName(name)
        {
            let guild = Arc::clone(ctx.guild);
            let state = Arc::clone(ctx.state);
            let f = ctx.lua.create_function(move |_, v: Value| {
                let Ok(mut st) = state.lock() else {
                    return Ok(String::new());
                };
                if st.mention_role_id_calls >= MAX_MENTION_ROLE_CALLS {
                    return Ok(String::new());
                }
                st.mention_role_id_calls += 1;

                let Some(raw) = value_to_id(&v) else {
                    return Ok(String::new());
                };
                let id = RoleId::new(raw);
                if guild.role(id).is_none() {
                    return Ok("(role not found)".to_string());
                }
                Ok(record_role_mention(&mut st, id))
            })?;
            globals.set("mentionRoleID", f)?;
        }
        {
            let guild = Arc::clone(ctx.guild);
            let state = Arc::clone(ctx.state);
            let f = ctx.lua.create_function(move |_, name: String| {
                let Ok(mut st) = state.lock() else {
                    return Ok(String::new());
                };
                if st.mention_role_name_calls >= MAX_MENTION_ROLE_CALLS {
                    return Ok(String::new());
                }
                st.mention_role_name_calls += 1;

                // Name resolution is case-sensitive here, unlike the
                // membership check below. Legacy behavior, kept on purpose.
                let Some(role) = guild.role_by_name(&name) else {
                    return Ok("(role not found)".to_string());
                };
                Ok(record_role_mention(&mut st, role.id))
            })?;
            globals.set("mentionRoleName", f)?;
        }

        // hasRoleID(id) / hasRoleName(name)
        {
            let member = Arc::clone(ctx.member);
            let state = Arc::clone(ctx.state);
            let f = ctx.lua.create_function(move |_, v: Value| {
                let Ok(mut st) = state.lock() else {
                    return Ok(false);
                };
                if st.has_role_id_calls >= MAX_HAS_ROLE_CALLS {
                    return Ok(false);
                }
                st.has_role_id_calls += 1;
                drop(st);

                let Some(raw) = value_to_id(&v) else {
                    return Ok(false);
                };
                Ok(member.has_role(RoleId::new(raw)))
            })?;
            globals.set("hasRoleID", f)?;
        }
        {
            let guild = Arc::clone(ctx.guild);
            let member = Arc::clone(ctx.member);
            let state = Arc::clone(ctx.state);
            let f = ctx.lua.create_function(move |_, name: String| {
                let Ok(mut st) = state.lock() else {
                    return Ok(false);
                };
                if st.has_role_name_calls >= MAX_HAS_ROLE_CALLS {
                    return Ok(false);
                }
                st.has_role_name_calls += 1;
                drop(st);

                let wanted = name.to_lowercase();
                let found = guild
                    .roles
                    .iter()
                    .find(|r| r.name.to_lowercase() == wanted);
                Ok(match found {
                    Some(role) => member.has_role(role.id),
                    None => false,
                })
            })?;
            globals.set("hasRoleName", f)?;
        }

        Ok(())
    }
}

/// Record a role for mentioning, returning the token the script embeds.
///
/// A fresh role yields a space-padded token and grows the list (up to the
/// hard cap); an already-recorded role yields the bare token so the list
/// never grows twice for one role.
fn record_role_mention(st: &mut RenderState, id: RoleId) -> String {
    if st.mention_roles.contains(&id) {
        return format!("<@&{}>", id);
    }
    if st.mention_roles.len() >= MAX_MENTION_ROLES {
        return String::new();
    }
    st.mention_roles.push(id);
    format!(" <@&{}> ", id)
}

/// Accept role ids the way scripts pass them: integers, whole floats, or
/// digit strings. Anything else is silently no id at all.
fn value_to_id(v: &Value) -> Option<u64> {
    match v {
        Value::Integer(i) if *i >= 0 => Some(*i as u64),
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as u64),
        Value::String(s) => s.to_str().ok()?.parse().ok(),
        _ => None,
    }
}
