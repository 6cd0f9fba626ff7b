//! The per-invocation script context.
//!
//! One context serves exactly one script execution: built, rendered,
//! destroyed. The engine is Lua via mlua; scripts produce output through
//! the bound `emit(...)` function and/or their string return value, and
//! the final text always passes through the mention sanitizer.

use std::sync::{Arc, Mutex};

use mlua::{HookTriggers, Lua, Value, Variadic};

use herald_core::{BotUser, Channel, Guild, Member, Message, RoleId};

use crate::caps::{BaseCapabilities, BindingCtx, CapabilityProvider};
use crate::error::{Result, ScriptError};
use crate::outbound::{NullOutbound, Outbound};
use crate::sanitize::escape_mentions;

/// Mutation state accumulated while a script runs.
///
/// Shared between the capability closures and the context itself; strictly
/// single-threaded in practice since a context is never shared.
#[derive(Debug, Default)]
pub(crate) struct RenderState {
    pub(crate) out: String,
    pub(crate) sent_dm: bool,
    pub(crate) mention_everyone: bool,
    pub(crate) mention_here: bool,
    pub(crate) mention_roles: Vec<RoleId>,
    pub(crate) mention_role_id_calls: u32,
    pub(crate) mention_role_name_calls: u32,
    pub(crate) has_role_id_calls: u32,
    pub(crate) has_role_name_calls: u32,
}

/// Builds a [`ScriptContext`] from entity snapshots and a closed provider
/// set.
pub struct ScriptContextBuilder {
    bot: BotUser,
    guild: Arc<Guild>,
    channel: Channel,
    member: Arc<Member>,
    message: Option<Message>,
    outbound: Arc<dyn Outbound>,
    providers: Vec<Box<dyn CapabilityProvider>>,
    instruction_limit: Option<u32>,
}

impl ScriptContextBuilder {
    /// Start a builder with the default capability set and a null outbound
    /// sink.
    pub fn new(bot: BotUser, guild: Guild, channel: Channel, member: Member) -> Self {
        Self {
            bot,
            guild: Arc::new(guild),
            channel,
            member: Arc::new(member),
            message: None,
            outbound: Arc::new(NullOutbound),
            providers: vec![Box::new(BaseCapabilities)],
            instruction_limit: None,
        }
    }

    /// Use a real outbound collaborator instead of the null sink.
    pub fn outbound(mut self, outbound: Arc<dyn Outbound>) -> Self {
        self.outbound = outbound;
        self
    }

    /// Attach the originating message. Without one, a synthetic message
    /// authored by the bot is bound instead.
    pub fn message(mut self, message: Message) -> Self {
        self.message = Some(message);
        self
    }

    /// Append an additional capability provider.
    pub fn provider(mut self, provider: Box<dyn CapabilityProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Abort execution after roughly this many Lua instructions. The
    /// deterministic call caps hold with or without this.
    pub fn instruction_limit(mut self, limit: u32) -> Self {
        self.instruction_limit = Some(limit);
        self
    }

    /// Bind functions and data and produce a ready-to-render context.
    pub fn build(self) -> Result<ScriptContext> {
        let lua = Lua::new();
        let state = Arc::new(Mutex::new(RenderState::default()));

        let message = self
            .message
            .unwrap_or_else(|| Message::synthetic(&self.bot, self.channel.id));

        // Functions first, then data, matching the context lifecycle.
        {
            let binding = BindingCtx {
                lua: &lua,
                bot: &self.bot,
                guild: &self.guild,
                member: &self.member,
                outbound: &self.outbound,
                state: &state,
            };
            for provider in &self.providers {
                provider.bind(&binding)?;
            }
        }

        bind_emit(&lua, &state)?;
        bind_data(
            &lua,
            &self.guild,
            &self.channel,
            &self.member,
            &self.bot,
            &message,
        )?;

        if let Some(limit) = self.instruction_limit {
            lua.set_hook(
                HookTriggers::new().every_nth_instruction(limit),
                |_lua, _debug| {
                    Err(mlua::Error::RuntimeError(
                        "instruction budget exhausted".into(),
                    ))
                },
            );
        }

        Ok(ScriptContext { lua, state })
    }
}

/// A sandboxed, single-use script execution context.
pub struct ScriptContext {
    lua: Lua,
    state: Arc<Mutex<RenderState>>,
}

impl ScriptContext {
    /// Parse and execute a script, returning the sanitized output.
    ///
    /// Consumes the context: one invocation, one context, never reused.
    /// A parse failure is [`ScriptError::Syntax`]; an execution failure is
    /// [`ScriptError::Runtime`] carrying whatever sanitized partial output
    /// the script had already produced.
    pub fn render(self, source: &str) -> Result<String> {
        let func = match self.lua.load(source).into_function() {
            Ok(f) => f,
            Err(mlua::Error::SyntaxError { message, .. }) => {
                return Err(ScriptError::Syntax { message })
            }
            Err(e) => return Err(ScriptError::Binding(e)),
        };

        match func.call::<_, Value>(()) {
            Ok(returned) => {
                self.append_return_value(returned);
                Ok(self.finish())
            }
            Err(e) => {
                let partial = self.finish();
                Err(ScriptError::Runtime {
                    message: e.to_string(),
                    partial,
                })
            }
        }
    }

    /// Append the script's return value to the output buffer, coercing
    /// numbers the way Lua would. Non-stringable returns are ignored.
    fn append_return_value(&self, v: Value) {
        if matches!(v, Value::Nil) {
            return;
        }
        if let Ok(Some(s)) = self.lua.coerce_string(v) {
            if let (Ok(text), Ok(mut st)) = (s.to_str(), self.state.lock()) {
                st.out.push_str(text);
            }
        }
    }

    /// Take the accumulated output and run it through the sanitizer under
    /// the flags the script earned during execution.
    fn finish(&self) -> String {
        let Ok(mut st) = self.state.lock() else {
            return String::new();
        };
        let out = std::mem::take(&mut st.out);
        escape_mentions(
            &out,
            st.mention_everyone,
            st.mention_here,
            &st.mention_roles,
        )
    }
}

/// Bind `emit(...)`: the script's append-to-output function. Emitted text
/// survives a later runtime error, which is what makes partial output
/// possible.
fn bind_emit(lua: &Lua, state: &Arc<Mutex<RenderState>>) -> Result<()> {
    let state = Arc::clone(state);
    let f = lua.create_function(move |_, parts: Variadic<String>| {
        if let Ok(mut st) = state.lock() {
            for p in parts {
                st.out.push_str(&p);
            }
        }
        Ok(())
    })?;
    lua.globals().set("emit", f)?;
    Ok(())
}

/// Expose the entity snapshots as read bindings, including the legacy
/// aliases older scripts rely on.
fn bind_data(
    lua: &Lua,
    guild: &Guild,
    channel: &Channel,
    member: &Member,
    bot: &BotUser,
    message: &Message,
) -> Result<()> {
    use mlua::LuaSerdeExt;

    let globals = lua.globals();

    let guild_value = lua.to_value(guild)?;
    globals.set("Guild", guild_value.clone())?;
    globals.set("Server", guild_value.clone())?;
    globals.set("server", guild_value)?;

    let channel_value = lua.to_value(channel)?;
    globals.set("Channel", channel_value.clone())?;
    globals.set("channel", channel_value)?;

    globals.set("Member", lua.to_value(member)?)?;

    let user = lua.create_table()?;
    user.set("id", member.user_id.get())?;
    user.set("username", member.username.as_str())?;
    globals.set("User", user.clone())?;
    globals.set("user", user)?;

    let bot_table = lua.create_table()?;
    bot_table.set("id", bot.id.get())?;
    bot_table.set("username", bot.username.as_str())?;
    globals.set("Bot", bot_table)?;

    globals.set("Msg", lua.to_value(message)?)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::OutboundError;
    use herald_core::{ChannelId, GuildId, Permissions, Role, UserId};

    const GUILD: u64 = 1000;
    const CHANNEL: u64 = 2000;
    const ALICE: u64 = 2;
    const MOD_ROLE: u64 = 3000;
    const OTHER_ROLE: u64 = 3001;

    fn fixture() -> (BotUser, Guild, Channel, Member) {
        let guild = Guild {
            id: GuildId::new(GUILD),
            name: "testers".into(),
            owner_id: UserId::new(1),
            roles: vec![
                Role {
                    id: GuildId::new(GUILD).everyone_role(),
                    name: "@everyone".into(),
                    permissions: Permissions::SEND_MESSAGES,
                },
                Role {
                    id: RoleId::new(MOD_ROLE),
                    name: "Mods".into(),
                    permissions: Permissions::KICK_MEMBERS,
                },
                Role {
                    id: RoleId::new(OTHER_ROLE),
                    name: "Artists".into(),
                    permissions: Permissions::empty(),
                },
            ],
            channels: vec![],
            members: vec![],
        };
        let channel = Channel {
            id: ChannelId::new(CHANNEL),
            name: "general".into(),
            overwrites: vec![],
        };
        let member = Member {
            user_id: UserId::new(ALICE),
            username: "alice".into(),
            roles: vec![RoleId::new(MOD_ROLE)],
        };
        let bot = BotUser {
            id: UserId::new(99),
            username: "herald".into(),
        };
        (bot, guild, channel, member)
    }

    fn context() -> ScriptContext {
        let (bot, guild, channel, member) = fixture();
        ScriptContextBuilder::new(bot, guild, channel, member)
            .build()
            .unwrap()
    }

    /// Outbound sink that remembers every DM it was asked to deliver.
    #[derive(Default)]
    struct RecordingOutbound {
        dms: Mutex<Vec<(UserId, String)>>,
    }

    impl Outbound for RecordingOutbound {
        fn deliver_dm(&self, user: UserId, text: &str) -> std::result::Result<(), OutboundError> {
            self.dms.lock().unwrap().push((user, text.to_string()));
            Ok(())
        }

        fn deliver_channel(&self, _: ChannelId, _: &str) -> std::result::Result<(), OutboundError> {
            Ok(())
        }
    }

    #[test]
    fn test_return_value_is_output() {
        let out = context().render(r#"return "hello " .. User.username"#).unwrap();
        assert_eq!(out, "hello alice");
    }

    #[test]
    fn test_emit_and_return_concatenate() {
        let out = context()
            .render(r#"emit("a", "b") emit("c") return "d""#)
            .unwrap();
        assert_eq!(out, "abcd");
    }

    #[test]
    fn test_legacy_aliases_bound() {
        let out = context()
            .render(r#"return Server.name .. "/" .. server.name .. "/" .. Guild.name"#)
            .unwrap();
        assert_eq!(out, "testers/testers/testers");
    }

    #[test]
    fn test_syntax_error() {
        let err = context().render("return ((").unwrap_err();
        assert!(matches!(err, ScriptError::Syntax { .. }));
    }

    #[test]
    fn test_runtime_error_preserves_partial_output() {
        let err = context()
            .render(r#"emit("partial ") error("boom")"#)
            .unwrap_err();
        match err {
            ScriptError::Runtime { partial, message } => {
                assert_eq!(partial, "partial ");
                assert!(message.contains("boom"));
            }
            other => panic!("expected runtime error, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_output_is_sanitized_too() {
        let err = context()
            .render(r#"emit("@everyone") error("boom")"#)
            .unwrap_err();
        match err {
            ScriptError::Runtime { partial, .. } => {
                assert_eq!(partial, "@\u{200b}everyone");
            }
            other => panic!("expected runtime error, got {:?}", other),
        }
    }

    #[test]
    fn test_raw_everyone_neutralized() {
        let out = context().render(r#"return "hi @everyone""#).unwrap();
        assert_eq!(out, "hi @\u{200b}everyone");
    }

    #[test]
    fn test_capability_unlocks_everyone() {
        let out = context()
            .render(r#"return "hi" .. mentionEveryone()"#)
            .unwrap();
        assert_eq!(out, "hi @everyone ");
    }

    #[test]
    fn test_mention_here_flag_is_separate() {
        let out = context()
            .render(r#"return mentionHere() .. "@everyone""#)
            .unwrap();
        assert_eq!(out, " @here @\u{200b}everyone");
    }

    #[test]
    fn test_mention_role_id_twice() {
        let out = context()
            .render(&format!(
                r#"return mentionRoleID({MOD_ROLE}) .. "|" .. mentionRoleID({MOD_ROLE})"#
            ))
            .unwrap();
        // Fresh token is space-padded; repeat token is bare, and both
        // survive the sanitizer because the role was recorded.
        assert_eq!(out, format!(" <@&{MOD_ROLE}> |<@&{MOD_ROLE}>"));
    }

    #[test]
    fn test_mention_role_unknown() {
        let out = context().render(r#"return mentionRoleID(424242)"#).unwrap();
        assert_eq!(out, "(role not found)");
    }

    #[test]
    fn test_unrecorded_role_mention_escaped() {
        let out = context()
            .render(&format!(r#"return "<@&{OTHER_ROLE}>""#))
            .unwrap();
        assert_eq!(out, format!("<@\u{200b}&{OTHER_ROLE}>"));
    }

    #[test]
    fn test_mention_role_name_is_case_sensitive() {
        let out = context().render(r#"return mentionRoleName("mods")"#).unwrap();
        assert_eq!(out, "(role not found)");

        let out = context().render(r#"return mentionRoleName("Mods")"#).unwrap();
        assert_eq!(out, format!(" <@&{MOD_ROLE}> "));
    }

    #[test]
    fn test_mention_role_call_cap() {
        // Calls past the cap are silent no-ops, and the unknown-role
        // marker disappears with them.
        let out = context()
            .render(&format!(
                r#"
                for i = 1, 50 do mentionRoleID(424242) end
                return mentionRoleID({MOD_ROLE})
                "#
            ))
            .unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn test_has_role_id() {
        let out = context()
            .render(&format!(
                r#"return tostring(hasRoleID({MOD_ROLE})) .. "/" .. tostring(hasRoleID({OTHER_ROLE}))"#
            ))
            .unwrap();
        assert_eq!(out, "true/false");
    }

    #[test]
    fn test_has_role_id_call_cap() {
        let out = context()
            .render(&format!(
                r#"
                local last
                for i = 1, 101 do last = hasRoleID({MOD_ROLE}) end
                return tostring(last)
                "#
            ))
            .unwrap();
        assert_eq!(out, "false");

        let out = context()
            .render(&format!(
                r#"
                local last
                for i = 1, 100 do last = hasRoleID({MOD_ROLE}) end
                return tostring(last)
                "#
            ))
            .unwrap();
        assert_eq!(out, "true");
    }

    #[test]
    fn test_has_role_name_case_insensitive() {
        let out = context()
            .render(r#"return tostring(hasRoleName("mods")) .. "/" .. tostring(hasRoleName("nosuch"))"#)
            .unwrap();
        assert_eq!(out, "true/false");
    }

    #[test]
    fn test_role_id_as_string_accepted() {
        let out = context()
            .render(&format!(r#"return tostring(hasRoleID("{MOD_ROLE}"))"#))
            .unwrap();
        assert_eq!(out, "true");
    }

    #[test]
    fn test_send_dm_once() {
        let outbound = Arc::new(RecordingOutbound::default());
        let (bot, guild, channel, member) = fixture();
        let ctx = ScriptContextBuilder::new(bot, guild, channel, member)
            .outbound(outbound.clone())
            .build()
            .unwrap();

        ctx.render(r#"sendDM("hello") sendDM("again") return "done""#)
            .unwrap();

        let dms = outbound.dms.lock().unwrap();
        assert_eq!(dms.len(), 1);
        assert_eq!(dms[0].0, UserId::new(ALICE));
        assert_eq!(
            dms[0].1,
            "Custom command DM from the server **testers**:\nhello"
        );
    }

    #[test]
    fn test_instruction_limit_aborts_loops() {
        let (bot, guild, channel, member) = fixture();
        let ctx = ScriptContextBuilder::new(bot, guild, channel, member)
            .instruction_limit(10_000)
            .build()
            .unwrap();

        let err = ctx
            .render(r#"emit("before ") while true do end"#)
            .unwrap_err();
        match err {
            ScriptError::Runtime { partial, .. } => assert_eq!(partial, "before "),
            other => panic!("expected runtime error, got {:?}", other),
        }
    }
}
