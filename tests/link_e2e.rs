//! End-to-end tests: the services binary linked to a scripted hub.

mod common;

use common::{FakeHub, TestServices};

const ALICE: &str = "A N alice 1 1700000000 alice alice.example.org +i AAAAAA AAAAB :Alice";
const BOB: &str = "A N bob 1 1700000000 bob 10.1.2.3 +i AAAAAA AAAAC :Bob";

#[tokio::test]
async fn links_bursts_and_joins_operations_channel() -> anyhow::Result<()> {
    let hub = FakeHub::bind().await?;
    let _services = TestServices::spawn(hub.port())?;
    let mut conn = hub.accept().await?;

    let intros = conn.link(&[ALICE]).await?;
    assert_eq!(intros.len(), 3);
    assert!(intros[0].starts_with("S N AuthServ 1 "));
    assert!(intros[0].ends_with(" +iok AAAAAA SAAA :Authentication Service"));
    assert!(intros[1].starts_with("S N HostServ 1 "));
    assert!(intros[2].starts_with("S N SpamServ 1 "));

    assert!(conn.recv().await?.starts_with("SAAA C #opers "));
    assert!(conn.recv().await?.starts_with("SAAB J #opers "));

    conn.send("A G !1700000200.5 services.test.net").await?;
    assert_eq!(conn.recv().await?, "S Z !1700000200.5 services.test.net");
    Ok(())
}

#[tokio::test]
async fn registers_an_account_over_the_link() -> anyhow::Result<()> {
    let hub = FakeHub::bind().await?;
    let services = TestServices::spawn(hub.port())?;
    let mut conn = hub.accept().await?;
    conn.link(&[ALICE]).await?;
    conn.recv_until("SAAB J #opers").await?;

    conn.send("AAAAB P SAAA :HELLO alice@example.org alice@example.org")
        .await?;
    let reply = conn.recv_until("SAAA P AAAAB :").await?;
    assert!(reply.contains("has been registered"), "unexpected reply: {reply}");
    let hint = conn.recv_until("SAAA P AAAAB :").await?;
    assert!(hint.contains("AUTH alice <password>"), "unexpected reply: {hint}");
    assert!(services.database_path().exists());

    // The nick is taken now.
    conn.send("AAAAB P SAAA :HELLO alice@example.org alice@example.org")
        .await?;
    let reply = conn.recv_until("SAAA P AAAAB :").await?;
    assert!(reply.contains("already registered"), "unexpected reply: {reply}");

    conn.send("AAAAB P SAAA :AUTH alice wrongpass").await?;
    assert_eq!(
        conn.recv_until("SAAA P AAAAB :").await?,
        "SAAA P AAAAB :Username or password incorrect."
    );
    Ok(())
}

#[tokio::test]
async fn removes_banned_word_from_protected_channel() -> anyhow::Result<()> {
    let hub = FakeHub::bind().await?;
    let _services = TestServices::spawn(hub.port())?;
    let mut conn = hub.accept().await?;
    conn.link(&[ALICE, BOB, "A B #test 1700000000 +tn AAAAC,AAAAB:o"])
        .await?;
    conn.recv_until("SAAB J #opers").await?;

    conn.send("AAAAB P SAAC :AUTH spamsecret").await?;
    assert_eq!(
        conn.recv_until("SAAC P AAAAB :").await?,
        "SAAC P AAAAB :You are now elevated for this session."
    );
    conn.send("AAAAB P SAAC :ADDCHAN #test").await?;
    conn.recv_until("SAAC J #test ").await?;

    conn.send("AAAAC P #test :SPAM!!").await?;
    assert_eq!(conn.recv_until("SAAC M #test").await?, "SAAC M #test +b *!*@10.1.2.3");
    assert_eq!(
        conn.recv_until("SAAC K #test").await?,
        "SAAC K #test AAAAC :used banned word: spam (incident #1)"
    );
    Ok(())
}

#[tokio::test]
async fn reconnects_when_the_hub_drops_the_link() -> anyhow::Result<()> {
    let hub = FakeHub::bind().await?;
    let _services = TestServices::spawn(hub.port())?;

    let mut conn = hub.accept().await?;
    conn.link(&[]).await?;
    drop(conn);

    // The supervisor notices on its next tick and links again from scratch.
    let mut conn = hub.accept().await?;
    let intros = conn.link(&[]).await?;
    assert_eq!(intros.len(), 3);
    Ok(())
}
