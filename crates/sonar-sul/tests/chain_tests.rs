use std::cell::RefCell;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::rc::Rc;
use std::time::Duration;

use sonar_mapper::MapperConfig;
use sonar_sul::wrapper::CounterWrapper;
use sonar_sul::{
    BoxedSul, ChainError, DynamicPortProvider, LauncherAdapter, LimitKind, MemorySink, SharedPort,
    Sul, SulChainBuilder, SulConfig, SulCounters, SulError, SulHandles, TcpLauncherClient,
};
use sonar_types::{CleanupTasks, InputSymbol, OutputBuilder, OutputSymbol};

type Log = Rc<RefCell<Vec<String>>>;

/// Answers `ACK_<input>`; `CRASH` fails with an I/O error, `CLOSE` reports
/// a closed socket, `SILENT` times out and `SLOW` answers after 120 ms.
struct ScriptedSul {
    log: Log,
    port: Option<SharedPort>,
}

impl ScriptedSul {
    fn boxed(log: &Log) -> BoxedSul<String> {
        Box::new(Self {
            log: log.clone(),
            port: None,
        })
    }
}

impl Sul for ScriptedSul {
    type Message = String;

    fn pre(&mut self) -> Result<(), SulError> {
        let port = self.port.as_ref().and_then(|p| p.dynamic_port());
        self.log.borrow_mut().push(match port {
            Some(port) => format!("pre:{port}"),
            None => "pre".to_string(),
        });
        Ok(())
    }

    fn post(&mut self) -> Result<(), SulError> {
        self.log.borrow_mut().push("post".to_string());
        Ok(())
    }

    fn step(&mut self, input: &InputSymbol) -> Result<OutputSymbol<String>, SulError> {
        self.log.borrow_mut().push(input.name().to_string());
        match input.name() {
            "CRASH" => Err(SulError::Io(std::io::ErrorKind::BrokenPipe.into())),
            "CLOSE" => Ok(OutputSymbol::SocketClosed),
            "SILENT" => Ok(OutputSymbol::Timeout),
            "SLOW" => {
                std::thread::sleep(Duration::from_millis(120));
                Ok(OutputSymbol::named("ACK_SLOW", None))
            }
            name => Ok(OutputSymbol::named(format!("ACK_{name}"), None)),
        }
    }

    fn attach(&mut self, handles: &SulHandles) {
        self.log.borrow_mut().push("attach".to_string());
        self.port = Some(handles.port.clone());
    }
}

fn input(name: &str) -> InputSymbol {
    InputSymbol::new(name)
}

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

#[test]
fn test_counters_and_logging() {
    let log = log();
    let sink = MemorySink::new();
    let mut chain = SulChainBuilder::new(&SulConfig::default());
    chain.logging("sul: ", sink.clone());
    let mut cleanup = CleanupTasks::new();
    let mut sul = chain.build(ScriptedSul::boxed(&log), &mut cleanup).unwrap();

    sul.pre().unwrap();
    assert_eq!(sul.step(&input("HELLO")).unwrap().name(), "ACK_HELLO");
    assert_eq!(sul.step(&input("DATA")).unwrap().name(), "ACK_DATA");
    sul.post().unwrap();

    assert_eq!(sul.stats().inputs, 2);
    assert_eq!(sul.stats().resets, 1);
    assert_eq!(
        sink.lines(),
        vec!["sul: reset", "sul: HELLO / ACK_HELLO", "sul: DATA / ACK_DATA"]
    );
    assert_eq!(*log.borrow(), vec!["attach", "pre", "HELLO", "DATA", "post"]);
    assert!(cleanup.is_empty());
}

#[test]
fn test_test_limit_stops_before_reaching_inner_layers() {
    let log = log();
    let mut chain = SulChainBuilder::new(&SulConfig::default());
    chain.test_limit(2);
    let mut cleanup = CleanupTasks::new();
    let mut sul = chain.build(ScriptedSul::boxed(&log), &mut cleanup).unwrap();

    for _ in 0..2 {
        sul.pre().unwrap();
        sul.step(&input("A")).unwrap();
        sul.post().unwrap();
    }
    assert!(matches!(
        sul.pre(),
        Err(SulError::LimitReached(LimitKind::Test))
    ));
    assert!(matches!(
        sul.step(&input("A")),
        Err(SulError::LimitReached(LimitKind::Test))
    ));
    sul.post().unwrap();

    assert_eq!(sul.stats().resets, 2);
    let pres = log.borrow().iter().filter(|l| *l == "pre").count();
    let posts = log.borrow().iter().filter(|l| *l == "post").count();
    assert_eq!((pres, posts), (2, 2));
}

#[test]
fn test_exhausted_time_limit() {
    let log = log();
    let mut chain = SulChainBuilder::new(&SulConfig::default());
    chain.time_limit(Duration::ZERO);
    let mut cleanup = CleanupTasks::new();
    let mut sul = chain.build(ScriptedSul::boxed(&log), &mut cleanup).unwrap();

    let err = sul.pre().unwrap_err();
    assert!(err.is_limit());
    assert!(matches!(err, SulError::LimitReached(LimitKind::Time)));
    assert_eq!(*log.borrow(), vec!["attach"]);
}

#[test]
fn test_time_limit_expiring_mid_query() {
    let log = log();
    let mut chain = SulChainBuilder::new(&SulConfig::default());
    chain.time_limit(Duration::from_millis(50));
    let mut cleanup = CleanupTasks::new();
    let mut sul = chain.build(ScriptedSul::boxed(&log), &mut cleanup).unwrap();

    sul.pre().unwrap();
    assert_eq!(sul.step(&input("SLOW")).unwrap().name(), "ACK_SLOW");
    assert!(matches!(
        sul.step(&input("A")),
        Err(SulError::LimitReached(LimitKind::Time))
    ));
    sul.post().unwrap();

    for _ in 0..3 {
        assert!(matches!(
            sul.pre(),
            Err(SulError::LimitReached(LimitKind::Time))
        ));
        assert!(matches!(
            sul.step(&input("A")),
            Err(SulError::LimitReached(LimitKind::Time))
        ));
        sul.post().unwrap();
    }

    assert_eq!(*log.borrow(), vec!["attach", "pre", "SLOW", "post"]);
}

#[test]
fn test_outermost_limit_reports_first() {
    let log = log();
    let mut chain = SulChainBuilder::new(&SulConfig::default());
    chain.time_limit(Duration::from_secs(3600)).test_limit(1);
    let mut cleanup = CleanupTasks::new();
    let mut sul = chain.build(ScriptedSul::boxed(&log), &mut cleanup).unwrap();

    sul.pre().unwrap();
    sul.post().unwrap();
    assert!(matches!(
        sul.pre(),
        Err(SulError::LimitReached(LimitKind::Test))
    ));
}

#[test]
fn test_limits_can_be_set_once() {
    let log = log();
    let mut chain = SulChainBuilder::new(&SulConfig::default());
    chain.test_limit(1).test_limit(10);
    let mut cleanup = CleanupTasks::new();
    let mut sul = chain.build(ScriptedSul::boxed(&log), &mut cleanup).unwrap();

    sul.pre().unwrap();
    sul.post().unwrap();
    assert!(sul.pre().unwrap_err().is_limit());
}

#[test]
fn test_crash_turns_into_socket_closed_for_rest_of_query() {
    let log = log();
    let mut cleanup = CleanupTasks::new();
    let mut sul = SulChainBuilder::new(&SulConfig::default())
        .build(ScriptedSul::boxed(&log), &mut cleanup)
        .unwrap();

    sul.pre().unwrap();
    assert_eq!(sul.step(&input("A")).unwrap().name(), "ACK_A");
    assert!(sul.step(&input("CRASH")).unwrap().is_socket_closed());
    assert!(sul.step(&input("B")).unwrap().is_socket_closed());
    assert!(!sul.liveness().is_alive());
    sul.post().unwrap();

    sul.pre().unwrap();
    assert!(sul.liveness().is_alive());
    assert_eq!(sul.step(&input("B")).unwrap().name(), "ACK_B");
    sul.post().unwrap();

    // B of the first query never reached the SUT.
    let steps: Vec<String> = log
        .borrow()
        .iter()
        .filter(|l| l.len() <= 5 && l.chars().all(|c| c.is_ascii_uppercase()))
        .cloned()
        .collect();
    assert_eq!(steps, vec!["A", "CRASH", "B"]);
    // Inputs counted even when short-circuited.
    assert_eq!(sul.stats().inputs, 4);
}

#[test]
fn test_socket_closed_as_timeout() {
    let log = log();
    let config = SulConfig {
        mapper: MapperConfig {
            socket_closed_as_timeout: true,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut cleanup = CleanupTasks::new();
    let mut sul = SulChainBuilder::new(&config)
        .build(ScriptedSul::boxed(&log), &mut cleanup)
        .unwrap();

    sul.pre().unwrap();
    let first = sul.step(&input("CLOSE")).unwrap();
    let second = sul.step(&input("A")).unwrap();
    assert!(first.is_timeout());
    assert_eq!(first, second);
    assert!(!sul.liveness().is_alive());
    sul.post().unwrap();
}

struct TaggedBuilder;

impl OutputBuilder<String> for TaggedBuilder {
    fn build_socket_closed(&self) -> OutputSymbol<String> {
        OutputSymbol::named("CONNECTION_LOST", None)
    }
}

#[test]
fn test_closed_output_uses_protocol_builder() {
    let log = log();
    let mut chain = SulChainBuilder::new(&SulConfig::default());
    chain.output_builder(TaggedBuilder);
    let mut cleanup = CleanupTasks::new();
    let mut sul = chain.build(ScriptedSul::boxed(&log), &mut cleanup).unwrap();

    sul.pre().unwrap();
    assert_eq!(sul.step(&input("CLOSE")).unwrap().name(), "CONNECTION_LOST");
    assert_eq!(sul.step(&input("A")).unwrap().name(), "CONNECTION_LOST");
    sul.post().unwrap();
}

#[test]
fn test_custom_layer_applied_in_call_order() {
    let log = log();
    let extra = SulCounters::new();
    let sink = MemorySink::new();
    let mut chain = SulChainBuilder::new(&SulConfig::default());
    chain.test_limit(1);
    let counters = extra.clone();
    chain.wrap_with("extra counters", move |sul: BoxedSul<String>| -> BoxedSul<String> {
        Box::new(CounterWrapper::new(sul, counters.clone()))
    });
    chain.logging("", sink.clone());
    let mut cleanup = CleanupTasks::new();
    let mut sul = chain.build(ScriptedSul::boxed(&log), &mut cleanup).unwrap();

    sul.pre().unwrap();
    sul.post().unwrap();
    assert!(sul.pre().is_err());

    // The custom layer sits outside the test limit, the logger outside both.
    assert_eq!(extra.resets(), 2);
    assert_eq!(sul.stats().resets, 1);
    assert_eq!(sink.lines(), vec!["reset", "reset"]);
}

#[test]
fn test_adapter_port_without_adapter() {
    let config = SulConfig {
        adapter_port: Some(4000),
        ..Default::default()
    };
    let mut cleanup = CleanupTasks::new();
    let result = SulChainBuilder::new(&config).build(ScriptedSul::boxed(&log()), &mut cleanup);
    assert!(matches!(result, Err(ChainError::MissingAdapter(4000))));

    let err = SulError::from(ChainError::MissingAdapter(4000));
    assert!(matches!(err, SulError::Config(ChainError::MissingAdapter(4000))));
    assert!(!err.is_transient());
}

/// `alive: None` makes the liveness query fail.
struct FakeLauncher {
    log: Log,
    alive: Option<bool>,
}

impl LauncherAdapter for FakeLauncher {
    fn start(&mut self) -> Result<Option<u16>, SulError> {
        self.log.borrow_mut().push("start".to_string());
        Ok(Some(7001))
    }

    fn stop(&mut self) -> Result<(), SulError> {
        self.log.borrow_mut().push("stop".to_string());
        Ok(())
    }

    fn is_alive(&mut self) -> Result<bool, SulError> {
        self.alive
            .ok_or_else(|| SulError::Adapter("garbled reply".to_string()))
    }
}

#[test]
fn test_adapter_publishes_port_to_raw_sul() {
    let log = log();
    let config = SulConfig {
        adapter_port: Some(4000),
        ..Default::default()
    };
    let launcher = FakeLauncher {
        log: log.clone(),
        alive: Some(true),
    };
    let mut cleanup = CleanupTasks::new();
    let mut sul = SulChainBuilder::new(&config)
        .with_adapter(Box::new(launcher))
        .build(ScriptedSul::boxed(&log), &mut cleanup)
        .unwrap();

    sul.pre().unwrap();
    sul.step(&input("A")).unwrap();
    sul.post().unwrap();

    assert_eq!(
        *log.borrow(),
        vec!["attach", "start", "pre:7001", "A", "post", "stop"]
    );
}

#[test]
fn test_failed_liveness_query_keeps_timeout() {
    let log = log();
    let config = SulConfig {
        adapter_port: Some(4000),
        ..Default::default()
    };
    let launcher = FakeLauncher {
        log: log.clone(),
        alive: None,
    };
    let mut cleanup = CleanupTasks::new();
    let mut sul = SulChainBuilder::new(&config)
        .with_adapter(Box::new(launcher))
        .build(ScriptedSul::boxed(&log), &mut cleanup)
        .unwrap();

    sul.pre().unwrap();
    assert!(sul.step(&input("SILENT")).unwrap().is_timeout());
    assert!(!sul.liveness().is_alive());
    assert!(sul.step(&input("A")).unwrap().is_socket_closed());
    sul.post().unwrap();

    assert_eq!(
        *log.borrow(),
        vec!["attach", "start", "pre:7001", "SILENT", "post", "stop"]
    );
}

#[test]
fn test_tcp_launcher_client() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = std::thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut writer = stream.try_clone().unwrap();
        let mut received = Vec::new();
        for line in BufReader::new(stream).lines() {
            let line = line.unwrap();
            let reply = match line.as_str() {
                "start" => Some("started 9100"),
                "stop" => Some("stopped"),
                "alive" => Some("alive false"),
                _ => None,
            };
            received.push(line.clone());
            match reply {
                Some(reply) => writeln!(writer, "{reply}").unwrap(),
                None => break,
            }
        }
        received
    });

    let mut client =
        TcpLauncherClient::new("127.0.0.1", port).with_timeout(Duration::from_secs(5));
    assert_eq!(client.start().unwrap(), Some(9100));
    assert!(!client.is_alive().unwrap());
    client.stop().unwrap();
    client.close();

    assert_eq!(server.join().unwrap(), vec!["start", "alive", "stop", "exit"]);
}

#[test]
fn test_unreachable_launcher() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut client = TcpLauncherClient::new("127.0.0.1", port);
    assert!(matches!(client.start(), Err(SulError::Adapter(_))));
}

#[cfg(unix)]
#[test]
fn test_process_layer_registers_cleanup() {
    let log = log();
    let config = SulConfig {
        command: Some("sleep 30".to_string()),
        ..Default::default()
    };
    let mut cleanup = CleanupTasks::new();
    let mut sul = SulChainBuilder::new(&config)
        .build(ScriptedSul::boxed(&log), &mut cleanup)
        .unwrap();
    assert_eq!(cleanup.len(), 1);

    sul.pre().unwrap();
    assert_eq!(sul.step(&input("A")).unwrap().name(), "ACK_A");
    sul.post().unwrap();

    cleanup.run_all();
    assert!(cleanup.is_empty());
}
