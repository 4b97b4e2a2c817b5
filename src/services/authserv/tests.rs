use super::*;
use crate::config::Config;
use crate::db::Database;
use crate::flags::UserFlags;
use crate::services::test_support::{self, privmsg, replies_to};
use crate::state::NetworkState;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

struct Harness {
    config: Config,
    db: Database,
    state: NetworkState,
    auth: AuthServ,
}

impl Harness {
    async fn new() -> Self {
        let config = test_support::config();
        let db = Database::new(":memory:").await.unwrap();
        let mut state = test_support::state();
        let mut auth = AuthServ::new(&config).unwrap();
        auth.introduce("S", 0);
        {
            let mut ctx = LineContext {
                config: &config,
                db: &db,
                state: &mut state,
                now: 0,
            };
            auth.activate(&mut ctx).await;
        }
        Self {
            config,
            db,
            state,
            auth,
        }
    }

    async fn line(&mut self, msg: Message) -> Vec<ServiceEffect> {
        let mut ctx = LineContext {
            config: &self.config,
            db: &self.db,
            state: &mut self.state,
            now: 1000,
        };
        self.auth.handle(&mut ctx, &msg).await
    }

    async fn say(&mut self, from: &str, text: &str) -> Vec<ServiceEffect> {
        self.line(privmsg(from, "SAAA", text)).await
    }

    /// Register `name` directly in the store and return its password.
    async fn account(&self, name: &str, email: &str) -> String {
        self.db.accounts().add_user(name, email).await.unwrap().1
    }

    fn login(&mut self, numeric: &str, account: &str) {
        self.state.user_mut(numeric).unwrap().account = Some(account.to_string());
    }
}

#[tokio::test]
async fn hello_registers_current_nick() {
    let mut h = Harness::new().await;
    let effects = h.say("AAAAB", "HELLO a@b.com a@b.com").await;

    let replies = replies_to(&effects, "AAAAB");
    assert_eq!(replies.len(), 2);
    assert!(replies[0].contains("has been registered"));
    assert!(replies[1].contains("AUTH alice"));
    assert!(h.db.accounts().is_registered("alice").await.unwrap());
    assert!(h.state.user("AAAAB").unwrap().newly_registered);

    let mail = h.db.mail().pending().await.unwrap();
    assert_eq!(mail.len(), 1);
    assert_eq!(mail[0].kind, "welcome");
    assert_eq!(mail[0].email, "a@b.com");
}

#[tokio::test]
async fn hello_rejects_registered_nick() {
    let mut h = Harness::new().await;
    h.account("alice", "x@y.com").await;
    let effects = h.say("AAAAB", "HELLO a@b.com a@b.com").await;
    let replies = replies_to(&effects, "AAAAB");
    assert_eq!(replies, ["The nickname \x02alice\x02 is already registered."]);
    assert!(!h.state.user("AAAAB").unwrap().newly_registered);
}

#[tokio::test]
async fn hello_rejects_bad_email() {
    let mut h = Harness::new().await;
    let replies = replies_to(&h.say("AAAAB", "HELLO a@b.com c@d.com").await, "AAAAB");
    assert_eq!(replies, ["E-mail addresses do not match."]);
    let replies = replies_to(&h.say("AAAAB", "HELLO nope nope").await, "AAAAB");
    assert_eq!(replies, ["Invalid e-mail address."]);
    let replies = replies_to(&h.say("AAAAB", "HELLO a@b.com").await, "AAAAB");
    assert_eq!(replies, ["Syntax: HELLO <email> <email>"]);
    assert!(!h.db.accounts().is_registered("alice").await.unwrap());
}

#[tokio::test]
async fn hello_enforces_accounts_per_email() {
    let mut h = Harness::new().await;
    h.account("someone", "a@b.com").await;
    let replies = replies_to(&h.say("AAAAB", "HELLO a@b.com a@b.com").await, "AAAAB");
    assert_eq!(
        replies,
        ["That e-mail address is already in use by too many accounts."]
    );
}

#[tokio::test]
async fn hello_when_authenticated() {
    let mut h = Harness::new().await;
    h.login("AAAAB", "alice");
    let replies = replies_to(&h.say("AAAAB", "HELLO a@b.com a@b.com").await, "AAAAB");
    assert_eq!(replies, ["You are already authenticated as \x02alice\x02."]);
}

#[tokio::test]
async fn auth_wrong_password_is_generic() {
    let mut h = Harness::new().await;
    h.account("alice", "a@b.com").await;

    let effects = h.say("AAAAB", "AUTH alice wrongpass").await;
    assert_eq!(replies_to(&effects, "AAAAB"), ["Username or password incorrect."]);
    assert!(
        !effects
            .iter()
            .any(|e| matches!(e, ServiceEffect::AccountBind { .. }))
    );

    let effects = h.say("AAAAB", "AUTH nobody wrongpass").await;
    assert_eq!(replies_to(&effects, "AAAAB"), ["Username or password incorrect."]);
    assert!(h.state.user("AAAAB").unwrap().account.is_none());
}

#[tokio::test]
async fn auth_binds_account_and_requests_cloak() {
    let mut h = Harness::new().await;
    let password = h.account("alice", "a@b.com").await;

    let effects = h.say("AAAAB", &format!("AUTH Alice {password}")).await;
    assert!(effects.contains(&ServiceEffect::AccountBind {
        target: "AAAAB".into(),
        account: "alice".into(),
    }));
    assert!(effects.contains(&ServiceEffect::ApplyCloak {
        target: "AAAAB".into(),
    }));
    assert_eq!(
        replies_to(&effects, "AAAAB"),
        ["You are now authenticated as \x02alice\x02."]
    );

    let account = h.db.accounts().find("alice").await.unwrap().unwrap();
    assert_eq!(account.last_host.as_deref(), Some("alice.example.org"));
    assert!(account.last_auth.is_some());
}

#[tokio::test]
async fn auth_skips_cloak_without_hostserv() {
    let mut h = Harness::new().await;
    h.config.services.host.enabled = false;
    let password = h.account("alice", "a@b.com").await;
    let effects = h.say("AAAAB", &format!("AUTH alice {password}")).await;
    assert!(
        !effects
            .iter()
            .any(|e| matches!(e, ServiceEffect::ApplyCloak { .. }))
    );
}

#[tokio::test]
async fn auth_must_be_direct() {
    let mut h = Harness::new().await;
    let password = h.account("alice", "a@b.com").await;
    let effects = h
        .line(privmsg(
            "AAAAB",
            "AuthServ@services.test.net",
            &format!("AUTH alice {password}"),
        ))
        .await;
    let replies = replies_to(&effects, "AAAAB");
    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("For security"));
    assert!(
        !effects
            .iter()
            .any(|e| matches!(e, ServiceEffect::AccountBind { .. }))
    );
}

#[tokio::test]
async fn relayed_target_reaches_other_commands() {
    let mut h = Harness::new().await;
    let effects = h
        .line(privmsg("AAAAB", "authserv@services.test.net", "VERSION"))
        .await;
    assert_eq!(replies_to(&effects, "AAAAB").len(), 1);
}

#[tokio::test]
async fn lines_for_other_targets_are_ignored() {
    let mut h = Harness::new().await;
    assert!(h.line(privmsg("AAAAB", "SAAB", "VERSION")).await.is_empty());
    assert!(h.line(privmsg("AAAAB", "#chan", "VERSION")).await.is_empty());
}

#[tokio::test]
async fn unknown_command_reply() {
    let mut h = Harness::new().await;
    let replies = replies_to(&h.say("AAAAB", "frobnicate").await, "AAAAB");
    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("Unknown command: \x02FROBNICATE\x02"));
}

#[tokio::test]
async fn notice_preference_switches_reply_command() {
    let mut h = Harness::new().await;
    h.account("alice", "a@b.com").await;
    h.db.accounts()
        .set_flags("alice", UserFlags::NOTICE.bits())
        .await
        .unwrap();
    h.login("AAAAB", "alice");
    let effects = h.say("AAAAB", "USERFLAGS").await;
    let ServiceEffect::Send(msg) = &effects[0] else {
        panic!("expected a reply");
    };
    assert!(msg.is("O"));
    assert_eq!(msg.last_arg(), Some("Flags for \x02alice\x02: +n"));
}

#[tokio::test]
async fn userflags_unprivileged_cannot_grant_oper() {
    let mut h = Harness::new().await;
    h.account("alice", "a@b.com").await;
    h.login("AAAAB", "alice");

    h.say("AAAAB", "USERFLAGS +o").await;
    assert_eq!(h.db.accounts().flags("alice").await.unwrap(), 0);

    h.say("AAAAB", "USERFLAGS +on").await;
    assert_eq!(
        h.db.accounts().flags("alice").await.unwrap(),
        UserFlags::NOTICE.bits()
    );

    let replies = replies_to(&h.say("AAAAB", "USERFLAGS bob +o").await, "AAAAB");
    assert_eq!(replies, ["Permission denied."]);
}

#[tokio::test]
async fn userflags_privileged_edits_other_user() {
    let mut h = Harness::new().await;
    h.account("alice", "a@b.com").await;
    h.account("bob", "bob@b.com").await;
    h.db.accounts()
        .set_flags("alice", UserFlags::OPER.bits())
        .await
        .unwrap();
    h.login("AAAAB", "alice");

    let replies = replies_to(&h.say("AAAAB", "USERFLAGS bob +h").await, "AAAAB");
    assert_eq!(replies, ["\x02bob\x02 is not authenticated."]);

    h.login("AAAAC", "bob");
    let replies = replies_to(&h.say("AAAAB", "USERFLAGS bob +hq").await, "AAAAB");
    assert_eq!(replies, ["Flags for \x02bob\x02: +qh"]);
    let replies = replies_to(&h.say("AAAAB", "USERFLAGS BOB").await, "AAAAB");
    assert_eq!(replies, ["Flags for \x02bob\x02: +qh"]);
}

#[tokio::test]
async fn userflags_requires_auth() {
    let mut h = Harness::new().await;
    let replies = replies_to(&h.say("AAAAB", "USERFLAGS").await, "AAAAB");
    assert_eq!(replies, ["You must be authenticated to use this command."]);
}

#[tokio::test]
async fn email_must_be_on_file() {
    let mut h = Harness::new().await;
    h.account("alice", "old@b.com").await;
    h.login("AAAAB", "alice");

    let replies = replies_to(&h.say("AAAAB", "EMAIL new@b.com new@b.com").await, "AAAAB");
    assert!(replies[0].starts_with("That address is not on file"));

    let replies = replies_to(&h.say("AAAAB", "EMAIL old@b.com old@b.com").await, "AAAAB");
    assert_eq!(replies, ["Your e-mail address is now \x02old@b.com\x02."]);
}

#[tokio::test]
async fn newpass_changes_password() {
    let mut h = Harness::new().await;
    let password = h.account("alice", "a@b.com").await;
    h.login("AAAAB", "alice");

    let replies = replies_to(&h.say("AAAAB", "NEWPASS wrong hunter22 hunter22").await, "AAAAB");
    assert_eq!(replies, ["Password incorrect."]);

    let cmd = format!("NEWPASS {password} hunter22 hunter23");
    let replies = replies_to(&h.say("AAAAB", &cmd).await, "AAAAB");
    assert_eq!(replies, ["New passwords do not match."]);

    let cmd = format!("NEWPASS {password} hunter22 hunter22");
    let replies = replies_to(&h.say("AAAAB", &cmd).await, "AAAAB");
    assert_eq!(replies, ["Your password has been changed."]);

    let account = h.db.accounts().verify("alice", "hunter22").await.unwrap();
    assert!(account.last_pwchange.is_some());
}

#[tokio::test]
async fn requestpassword_queues_reset() {
    let mut h = Harness::new().await;
    h.account("carol", "c@b.com").await;
    let replies = replies_to(&h.say("AAAAC", "REQUESTPASSWORD c@b.com").await, "AAAAC");
    assert_eq!(replies.len(), 1);

    let kinds: Vec<String> = h
        .db
        .mail()
        .pending()
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.kind)
        .collect();
    assert!(kinds.iter().any(|k| k == "reset"));

    h.login("AAAAC", "carol");
    let replies = replies_to(&h.say("AAAAC", "REQUESTPASSWORD c@b.com").await, "AAAAC");
    assert_eq!(replies, ["You are already authenticated as \x02carol\x02."]);
}

#[tokio::test]
async fn sasl_plain_from_server() {
    let mut h = Harness::new().await;
    let password = h.account("alice", "a@b.com").await;
    let payload = STANDARD.encode(format!("\0alice\0{password}"));

    let effects = h
        .line(privmsg("A", "SAAA", &format!("SASL A.123 PLAIN {payload}")))
        .await;
    let lines: Vec<String> = effects
        .iter()
        .filter_map(|e| match e {
            ServiceEffect::Send(m) => Some(m.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(lines, ["S SASL A A.123 L alice", "S SASL A A.123 D S"]);

    let payload = STANDARD.encode("\0alice\0nope");
    let effects = h
        .line(privmsg("A", "SAAA", &format!("SASL A.124 PLAIN {payload}")))
        .await;
    let ServiceEffect::Send(msg) = &effects[0] else {
        panic!("expected a SASL reply");
    };
    assert_eq!(msg.to_string(), "S SASL A A.124 D F");
}
