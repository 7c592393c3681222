use std::sync::Arc;
use std::time::Duration;

use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use wutbot_access::OwnerAccount;
use wutbot_connection::{
    run_irc_session, ConnectionConfig, SaslCredentials, ServerAddress,
};
use wutbot_runtime::{parse_channel_list, BotIdentity, ConcurrencyGate, EventRouter};

const SERVER: &str = ":irc.example.net";

struct FakeIrcd {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl FakeIrcd {
    async fn expect(&mut self, expected: &str) {
        let line = timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("client line within timeout")
            .expect("read client line")
            .expect("client stream open");
        assert_eq!(line.trim_end_matches('\r'), expected);
    }

    async fn send(&mut self, raw: &str) {
        self.writer
            .write_all(format!("{raw}\r\n").as_bytes())
            .await
            .expect("write to client");
    }

    async fn close(mut self) {
        self.writer.shutdown().await.expect("shutdown server side");
    }
}

fn start_bot(
    owner: &str,
    channels: &str,
    sasl: Option<SaslCredentials>,
) -> (FakeIrcd, JoinHandle<anyhow::Result<()>>) {
    let (client, server) = tokio::io::duplex(16 * 1024);
    let (server_read, server_write) = tokio::io::split(server);
    let ircd = FakeIrcd {
        lines: BufReader::new(server_read).lines(),
        writer: server_write,
    };

    let mut config = ConnectionConfig::new(
        ServerAddress::parse("irc.example.net").expect("server address"),
        "wutbot",
    );
    config.sasl = sasl;
    config.version = "wutbot-it".to_string();
    let router = Arc::new(EventRouter::new(
        BotIdentity::new("wutbot", OwnerAccount::new(owner)),
        parse_channel_list(channels),
        ConcurrencyGate::default(),
    ));
    let session = tokio::spawn(async move { run_irc_session(client, &config, router).await });
    (ircd, session)
}

#[tokio::test]
async fn integration_sasl_registration_with_nick_collision_reaches_channels() {
    let (mut ircd, session) = start_bot(
        "boss",
        "#chat",
        Some(SaslCredentials {
            login: "wutbot".to_string(),
            password: "hunter2".to_string(),
        }),
    );

    ircd.expect("CAP LS 302").await;
    ircd.expect("NICK wutbot").await;
    ircd.expect("USER wutbot 0 * wutbot").await;
    ircd.send(&format!("{SERVER} CAP * LS * :multi-prefix sasl=PLAIN,EXTERNAL"))
        .await;
    ircd.send(&format!("{SERVER} CAP * LS :account-tag server-time"))
        .await;
    ircd.expect("CAP REQ :server-time account-tag sasl").await;
    ircd.send(&format!("{SERVER} CAP * ACK :server-time account-tag sasl"))
        .await;
    ircd.expect("AUTHENTICATE PLAIN").await;
    ircd.send("AUTHENTICATE +").await;
    ircd.expect("AUTHENTICATE d3V0Ym90AHd1dGJvdABodW50ZXIy").await;
    ircd.send(&format!("{SERVER} 903 * :SASL authentication successful"))
        .await;
    ircd.expect("CAP END").await;

    ircd.send(&format!("{SERVER} 433 * wutbot :Nickname is already in use"))
        .await;
    ircd.expect("NICK wutbot_").await;
    ircd.send(&format!("{SERVER} 001 wutbot_ :Welcome")).await;
    ircd.send(&format!("{SERVER} 005 wutbot_ BOT=B CHANTYPES=#& :are supported"))
        .await;
    ircd.send(&format!("{SERVER} 422 wutbot_ :MOTD File is missing"))
        .await;
    ircd.expect("MODE wutbot_ +B").await;
    ircd.expect("JOIN #chat").await;

    ircd.close().await;
    let result = timeout(Duration::from_secs(5), session)
        .await
        .expect("session ends after EOF")
        .expect("session task");
    assert!(result.is_ok(), "session result: {result:?}");
}

#[tokio::test]
async fn integration_owner_commands_invites_and_strangers_over_one_session() {
    let (mut ircd, session) = start_bot("boss", "", None);

    ircd.expect("CAP LS 302").await;
    ircd.expect("NICK wutbot").await;
    ircd.expect("USER wutbot 0 * wutbot").await;
    ircd.send(&format!("{SERVER} CAP * LS :account-tag message-tags"))
        .await;
    ircd.expect("CAP REQ :message-tags account-tag").await;
    ircd.send(&format!("{SERVER} CAP * ACK :message-tags account-tag"))
        .await;
    ircd.expect("CAP END").await;
    ircd.send(&format!("{SERVER} 001 wutbot :Welcome")).await;
    ircd.send(&format!("{SERVER} 376 wutbot :End of MOTD")).await;

    // Invite from a stranger is ignored; the owner's invite is honored.
    ircd.send(":rando!u@h INVITE wutbot #elsewhere").await;
    ircd.send("@account=boss :boss!u@h INVITE wutbot #ops").await;
    ircd.expect("JOIN #ops").await;

    ircd.send("@account=rando :rando!u@h PRIVMSG wutbot :wutbot: abuse boss")
        .await;
    ircd.send("@account=boss :boss!u@h PRIVMSG #ops :wutbot: abuse rando")
        .await;
    ircd.expect("PRIVMSG #ops :rando isn't a real programmer").await;

    ircd.send("@account=boss :boss!u@h PRIVMSG wutbot :wutbot abuse someone")
        .await;
    ircd.expect("PRIVMSG wutbot :someone isn't a real programmer")
        .await;

    ircd.send(":rando!u@h PRIVMSG #ops :wutbot, hello?").await;
    ircd.expect("NOTICE #ops :don't @ me, mortal").await;

    // Account comparison is case-sensitive, so this is an ordinary mention.
    ircd.send("@account=Boss :boss!u@h PRIVMSG #ops :wutbot: quit")
        .await;
    ircd.expect("NOTICE #ops :don't @ me, mortal").await;

    ircd.send(":rando!u@h PRIVMSG #ops :\u{1}VERSION\u{1}").await;
    ircd.expect("NOTICE rando :\u{1}VERSION wutbot-it\u{1}").await;

    ircd.send("@account=boss :boss!u@h PRIVMSG #ops :wutbot: QUIT")
        .await;
    ircd.expect("QUIT wutbot-it").await;

    ircd.send("ERROR :Closing Link: wutbot (Quit: wutbot-it)").await;
    let result = timeout(Duration::from_secs(5), session)
        .await
        .expect("session ends after ERROR")
        .expect("session task");
    assert!(result.is_ok(), "session result: {result:?}");
}
