//! Plugin loading integration tests
//! Run with: cargo test --test plugin_loader_test

use std::sync::{Arc, Mutex, Once};

use modbot::application::bot::{BotHandle, ControlRequest};
use modbot::application::errors::{BotError, CommandError, PluginError, PluginResult};
use modbot::application::registry::{Registrar, Registry};
use modbot::application::services::{ModuleLoader, PluginHost};
use modbot::domain::entities::{Client, CommandHandler, Event, EventType, Message};
use modbot::domain::traits::{BotInfo, Connection};
use modbot::infrastructure::config::Config;
use modbot::plugins::{Plugin, PluginSource, SourceChain, StaticCatalog};

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

type Log = Arc<Mutex<Vec<String>>>;

/// Records every text the bot sends
#[derive(Default)]
struct RecordingConnection {
    sent: Mutex<Vec<(String, String)>>,
}

impl Connection for RecordingConnection {
    fn send_text(&self, client_id: &str, text: &str) -> Result<(), BotError> {
        self.sent.lock().unwrap().push((client_id.to_string(), text.to_string()));
        Ok(())
    }

    fn clients(&self) -> Result<Vec<Client>, BotError> {
        Ok(Vec::new())
    }

    fn quit(&self) -> Result<(), BotError> {
        Ok(())
    }

    fn info(&self) -> BotInfo {
        BotInfo {
            id: "test".to_string(),
            name: "test-bot".to_string(),
        }
    }
}

fn bot() -> (BotHandle, Arc<RecordingConnection>) {
    let connection = Arc::new(RecordingConnection::default());
    (BotHandle::new(connection.clone()), connection)
}

/// Plugin that logs its setup call together with the options it received
struct Recorder {
    name: String,
    log: Log,
}

impl Plugin for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    fn register(&self, registrar: &mut Registrar<'_>) -> PluginResult<()> {
        let log = Arc::clone(&self.log);
        let alias = registrar.alias().to_string();
        log.lock().unwrap().push(format!("register:{}", alias));
        registrar.setup(move |_bot, options| {
            let mut keys: Vec<String> = options
                .keys()
                .map(|k| format!("{}={}", k, options.get::<i64>(k).ok().flatten().unwrap_or_default()))
                .collect();
            keys.sort();
            let how = if options.is_configured() { "configured" } else { "defaults" };
            log.lock().unwrap().push(format!("setup:{}:{}:{}", alias, how, keys.join(",")));
            Ok(())
        });
        Ok(())
    }
}

fn recording_catalog(log: &Log, modules: &[&str]) -> StaticCatalog {
    let mut catalog = StaticCatalog::new();
    for module in modules {
        let log = Arc::clone(log);
        let name = module.to_string();
        catalog.insert(*module, move || {
            Box::new(Recorder {
                name: name.clone(),
                log: Arc::clone(&log),
            })
        });
    }
    catalog
}

fn setups(log: &Log) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .filter(|l| l.starts_with("setup:"))
        .cloned()
        .collect()
}

#[test]
fn every_plugin_is_set_up_once_in_configuration_order() {
    ensure_init();
    let log: Log = Arc::default();
    let catalog = recording_catalog(&log, &["gamma", "alpha", "beta"]);
    let mut config = Config::from_yaml("Plugins:\n  g: gamma\n  a: alpha\n  b: beta\n").unwrap();
    let mut registry = Registry::new();
    let (bot, _) = bot();

    let loaded = ModuleLoader::new(&catalog).load(&mut registry, &bot, &mut config).unwrap();

    assert_eq!(loaded.aliases(), vec!["g", "a", "b"]);
    assert_eq!(
        setups(&log),
        vec!["setup:g:defaults:", "setup:a:defaults:", "setup:b:defaults:"]
    );
    // every module registered before the first setup ran
    let entries = log.lock().unwrap().clone();
    let last_register = entries.iter().rposition(|l| l.starts_with("register:")).unwrap();
    let first_setup = entries.iter().position(|l| l.starts_with("setup:")).unwrap();
    assert!(last_register < first_setup);
}

#[test]
fn plugin_section_is_forwarded_as_named_options_and_consumed() {
    ensure_init();
    let log: Log = Arc::default();
    let catalog = recording_catalog(&log, &["x", "y"]);
    let mut config = Config::from_yaml(
        "Plugins:\n  X: x\n  Y: y\nX:\n  a: 1\n  b: 2\nOther:\n  untouched: true\n",
    )
    .unwrap();
    let mut registry = Registry::new();
    let (bot, _) = bot();

    ModuleLoader::new(&catalog).load(&mut registry, &bot, &mut config).unwrap();

    assert_eq!(setups(&log), vec!["setup:X:configured:a=1,b=2", "setup:Y:defaults:"]);
    assert!(!config.contains("Plugins"));
    assert!(!config.contains("X"));
    assert!(config.contains("Other"));
}

#[test]
fn two_segment_alias_reads_the_first_segment_section() {
    ensure_init();
    let log: Log = Arc::default();
    let catalog = recording_catalog(&log, &["weather.main"]);
    let mut config = Config::from_yaml("Plugins:\n  weather.main: weather.main\nweather:\n  a: 5\n").unwrap();
    let mut registry = Registry::new();
    let (bot, _) = bot();

    ModuleLoader::new(&catalog).load(&mut registry, &bot, &mut config).unwrap();

    assert_eq!(setups(&log), vec!["setup:weather.main:configured:a=5"]);
    assert!(!config.contains("weather"));
}

#[test]
fn missing_module_aborts_before_any_setup() {
    ensure_init();
    let log: Log = Arc::default();
    let catalog = recording_catalog(&log, &["alpha"]);
    let mut config = Config::from_yaml("Plugins:\n  a: alpha\n  ghost: does.not.exist\n").unwrap();
    let mut registry = Registry::new();
    let (bot, _) = bot();

    let result = ModuleLoader::new(&catalog).load(&mut registry, &bot, &mut config);

    assert!(matches!(
        result,
        Err(PluginError::NotFound { ref alias, ref module }) if alias == "ghost" && module == "does.not.exist"
    ));
    assert!(setups(&log).is_empty());
    // the module loaded before the failure is still owned by the registry
    assert_eq!(registry.modules().len(), 1);
}

#[test]
fn failed_registration_still_hands_the_module_to_the_registry() {
    ensure_init();

    struct BadName;
    impl Plugin for BadName {
        fn name(&self) -> &str {
            "bad-name"
        }
        fn register(&self, registrar: &mut Registrar<'_>) -> PluginResult<()> {
            registrar.on_exit(|| Ok(()));
            registrar.command(&["no spaces allowed"], CommandHandler::new(|_| Ok(())))?;
            Ok(())
        }
    }

    let catalog = StaticCatalog::new().with("bad", || Box::new(BadName));
    let mut config = Config::from_yaml("Plugins:\n  bad: bad\n").unwrap();
    let mut registry = Registry::new();
    let (bot, _) = bot();

    let result = ModuleLoader::new(&catalog).load(&mut registry, &bot, &mut config);

    assert!(matches!(result, Err(PluginError::Registration(_))));
    assert_eq!(registry.shutdown().len(), 1);
    assert_eq!(registry.modules().len(), 1);
    assert_eq!(registry.modules()[0].plugin().name(), "bad-name");
}

#[test]
fn options_section_that_is_not_a_mapping_is_fatal() {
    ensure_init();
    let log: Log = Arc::default();
    let catalog = recording_catalog(&log, &["x", "y"]);
    let mut config = Config::from_yaml("Plugins:\n  X: x\n  Y: y\nX: 3\n").unwrap();
    let mut registry = Registry::new();
    let (bot, _) = bot();

    let result = ModuleLoader::new(&catalog).load(&mut registry, &bot, &mut config);

    assert!(matches!(result, Err(PluginError::Options(_))));
    assert!(setups(&log).is_empty());
}

#[test]
fn malformed_spec_entry_is_fatal() {
    ensure_init();
    let log: Log = Arc::default();
    let catalog = recording_catalog(&log, &["alpha"]);
    let mut config = Config::from_yaml("Plugins:\n  a: alpha\n  broken: 42\n").unwrap();
    let mut registry = Registry::new();
    let (bot, _) = bot();

    let result = ModuleLoader::new(&catalog).load(&mut registry, &bot, &mut config);

    assert!(matches!(result, Err(PluginError::MalformedSpec(_))));
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn same_module_under_two_aliases_is_rejected() {
    ensure_init();
    let log: Log = Arc::default();
    let catalog = recording_catalog(&log, &["alpha"]);
    let mut config = Config::from_yaml("Plugins:\n  a: alpha\n  b: alpha\n").unwrap();
    let mut registry = Registry::new();
    let (bot, _) = bot();

    let result = ModuleLoader::new(&catalog).load(&mut registry, &bot, &mut config);

    assert!(matches!(result, Err(PluginError::MalformedSpec(_))));
    assert!(setups(&log).is_empty());
}

#[test]
fn setup_for_an_unloaded_alias_is_an_invariant_breach() {
    ensure_init();
    let catalog = StaticCatalog::new();
    let mut config = Config::from_yaml("Plugins: {}\n").unwrap();
    let mut registry = Registry::new();
    registry.registrar("stray").setup(|_, _| Ok(()));
    let (bot, _) = bot();

    let result = ModuleLoader::new(&catalog).load(&mut registry, &bot, &mut config);

    assert!(matches!(result, Err(PluginError::SetupResolution(_))));
}

#[test]
fn failing_setup_aborts_the_load() {
    ensure_init();

    struct Broken;
    impl Plugin for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn register(&self, registrar: &mut Registrar<'_>) -> PluginResult<()> {
            registrar.setup(|_, _| Err(PluginError::Options("bad".into())));
            Ok(())
        }
    }

    let catalog = StaticCatalog::new().with("broken", || Box::new(Broken));
    let mut config = Config::from_yaml("Plugins:\n  broken: broken\n").unwrap();
    let mut registry = Registry::new();
    let (bot, _) = bot();

    let result = ModuleLoader::new(&catalog).load(&mut registry, &bot, &mut config);

    assert!(matches!(result, Err(PluginError::Setup { ref plugin, .. }) if plugin == "broken"));
}

/// Plugin registering a command named `stop`, an observer and an exit hook
struct Contender {
    tag: &'static str,
    log: Log,
    fail_on_exit: bool,
}

impl Plugin for Contender {
    fn name(&self) -> &str {
        self.tag
    }

    fn register(&self, registrar: &mut Registrar<'_>) -> PluginResult<()> {
        let (tag, on_cmd, on_event, on_exit) = (
            self.tag,
            Arc::clone(&self.log),
            Arc::clone(&self.log),
            Arc::clone(&self.log),
        );
        let fail = self.fail_on_exit;

        registrar
            .command(
                &["stop"],
                CommandHandler::new(move |_| {
                    on_cmd.lock().unwrap().push(format!("stop:{}", tag));
                    Ok(())
                }),
            )?
            .on(&[EventType::Other("A".into())], move |_| {
                on_event.lock().unwrap().push(format!("event:{}", tag));
                Ok(())
            })
            .on_exit(move || {
                if fail {
                    return Err(PluginError::Hook(format!("{} teardown failed", tag)));
                }
                on_exit.lock().unwrap().push(format!("exit:{}", tag));
                Ok(())
            });
        Ok(())
    }
}

fn contender_source(log: &Log) -> SourceChain {
    let mut catalog = StaticCatalog::new();
    for (module, fail) in [("one", false), ("two", true), ("three", false)] {
        let log = Arc::clone(log);
        catalog.insert(module, move || {
            Box::new(Contender {
                tag: module,
                log: Arc::clone(&log),
                fail_on_exit: fail,
            })
        });
    }
    SourceChain::new().with_source(catalog)
}

#[test]
fn host_routes_events_commands_and_shutdown() {
    ensure_init();
    let log: Log = Arc::default();
    let source = contender_source(&log);
    let mut config = Config::from_yaml("Plugins:\n  one: one\n  two: two\n  three: three\n").unwrap();
    let (bot, _) = bot();

    let host = PluginHost::start(&source, bot, &mut config).unwrap();

    // every observer for "A" is called once, in registration order
    assert_eq!(host.dispatch_event(&Event::new(EventType::Other("A".into()))), 3);

    // last registration of "stop" wins
    let stop = Message::from_command("1", "stop", vec![]).with_sender(Client::new("9"));
    assert!(host.receive(&stop).unwrap());
    assert_eq!(host.registry().commands().handler_for("stop").unwrap().plugin.as_deref(), Some("three"));

    // second hook fails, first and third still run
    let report = host.shutdown();
    assert_eq!(report.invoked, 3);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].0, "two");

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "event:one",
            "event:two",
            "event:three",
            "stop:three",
            "exit:one",
            "exit:three",
        ]
    );
}

#[test]
fn builtin_plugins_work_end_to_end() {
    ensure_init();
    let source = SourceChain::new().with_source(StaticCatalog::builtin());
    let mut config = Config::from_yaml(
        "Bot:\n  prefix: \"!\"\nPlugins:\n  utils: utils\n  greeter: greeter\ngreeter:\n  welcome: \"Hi {nickname}\"\n",
    )
    .unwrap();
    let (bot, connection) = bot();

    let host = PluginHost::start(&source, bot, &mut config).unwrap();

    host.dispatch_event(
        &Event::new(EventType::ClientEntered)
            .with("clid", "42")
            .with("client_nickname", "Ann"),
    );

    let admin = Client::new("42").with_groups(["Server Admin"]);
    let guest = Client::new("43").with_groups(["Guest"]);

    assert!(host
        .receive(&Message::from_command("42", "version", vec![]).with_sender(admin.clone()))
        .unwrap());
    assert!(matches!(
        host.receive(&Message::from_command("43", "stop", vec![]).with_sender(guest)),
        Err(CommandError::PermissionDenied { .. })
    ));
    assert_eq!(host.bot().take_request(), None);

    assert!(host
        .receive(&Message::from_command("42", "reload", vec![]).with_sender(admin))
        .unwrap());
    assert_eq!(host.bot().take_request(), Some(ControlRequest::Restart));

    let admin = Client::new("42").with_groups(["Server Admin"]);
    assert!(host
        .receive(&Message::from_command("42", "help", vec![]).with_sender(admin))
        .unwrap());

    let sent = connection.sent.lock().unwrap().clone();
    assert_eq!(sent[0], ("42".to_string(), "Hi Ann".to_string()));
    assert!(sent[1].1.contains("`0.5`"));
    assert_eq!(sent[2].1, "The following bot commands are available:");
    assert_eq!(
        sent[3].1,
        "!commandlist, !commands, !help, !reload, !restart, !stop, !version"
    );

    assert!(host.shutdown().is_clean());
}

#[test]
fn dry_run_only_logs_control_commands() {
    ensure_init();
    let source = SourceChain::new().with_source(StaticCatalog::builtin());
    let mut config = Config::from_yaml("Plugins:\n  utils: utils\nutils:\n  enable_dry_run: true\n").unwrap();
    let (bot, _) = bot();

    let host = PluginHost::start(&source, bot, &mut config).unwrap();
    let admin = Client::new("1").with_groups(["Server Admin"]);

    host.receive(&Message::from_command("1", "stop", vec![]).with_sender(admin))
        .unwrap();

    assert_eq!(host.bot().take_request(), None);
}

#[test]
fn unknown_module_falls_through_the_chain() {
    ensure_init();
    let source = SourceChain::new()
        .with_source(StaticCatalog::new())
        .with_source(StaticCatalog::builtin());

    assert!(source.resolve("u", "utils").is_ok());
    assert!(matches!(
        source.resolve("n", "nothing"),
        Err(PluginError::NotFound { .. })
    ));
}
