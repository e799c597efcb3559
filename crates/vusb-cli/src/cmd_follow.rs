/// Implementation of `vusb follow`.
///
/// Wires the pieces of `vusb-follow` together on the main thread:
///
/// ```text
///   Follower thread ──► EventQueue ──► QueueSink ──► stdout
///         │                               ▲
///         └── progress ──► watch task ────┘ (MainLoop, main thread)
/// ```
///
/// The watch task prints progress to stderr and quits the loop once the
/// follower reports it is exhausted and every event has been printed.
/// Progress alone is not enough: a multi-member gzip file reaches 100%
/// long before its first member has been read. With `--tail` it only quits when the follower stops on its
/// own. Ctrl-C triggers the shared [`Interrupt`], which ends both the
/// follower and the loop; the command then exits successfully.
use std::io::Write as _;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use tracing::debug;
use vusb_follow::{
    EventQueue, Follower, FollowerConfig, HostLoop, Interrupt, LineParser, LoopHandle, MainLoop,
    Parser, Progress, QueueSink, RecordParser, ShutdownGuard,
};
use vusb_struct::{Record, RecordDecoder};

use crate::FollowArgs;
use crate::render;

/// How often the watch task checks progress and completion.
const WATCH_INTERVAL: Duration = Duration::from_millis(100);

/// # Errors
///
/// Returns an error if the layout does not parse, the file cannot be
/// opened, or a thread cannot be started.
pub fn run(args: &FollowArgs) -> Result<()> {
    let _shutdown = ShutdownGuard::new();
    let interrupt = Interrupt::new();
    spawn_ctrl_c(interrupt.clone())?;

    match &args.layout {
        None => follow_with::<LineParser, _>(
            args,
            &interrupt,
            |queue| Ok(LineParser::new(queue)),
            |line: String| println!("{line}"),
        ),
        Some(layout) => {
            let decoder = RecordDecoder::from_layout("record", layout)
                .with_context(|| format!("invalid layout {layout:?}"))?;
            let json = args.json;
            follow_with::<RecordParser, _>(
                args,
                &interrupt,
                |queue| Ok(RecordParser::new(decoder, queue)?),
                move |record: Record| print_record(&record, json),
            )
        }
    }
}

fn print_record(record: &Record, json: bool) {
    if json {
        println!("{}", render::record_json(record));
    } else {
        println!("{record}");
    }
}

/// Run one follower and one sink on a fresh [`MainLoop`] until done.
fn follow_with<P, F>(
    args: &FollowArgs,
    interrupt: &Interrupt,
    make_parser: F,
    print: impl FnMut(P::Event) + 'static,
) -> Result<()>
where
    P: Parser,
    F: FnOnce(EventQueue<P::Event>) -> Result<P>,
{
    let main_loop = MainLoop::with_interrupt(interrupt.clone());
    let sink = QueueSink::builder(main_loop.handle(), print)
        .interrupt(interrupt.clone())
        .attach()?;

    let config = FollowerConfig {
        chunk_size: args.chunk_size,
        ..FollowerConfig::default()
    };
    let (progress_tx, progress_rx) = crossbeam_channel::unbounded();
    let follower = Follower::builder(&args.file, make_parser(sink.queue().clone())?)
        .tail(args.tail)
        .progress(progress_tx)
        .config(config)
        .interrupt(interrupt.clone())
        .spawn()
        .with_context(|| format!("cannot follow {}", args.file.display()))?;
    let follower = Rc::new(follower);

    Watch {
        host: main_loop.handle(),
        progress: progress_rx,
        sink: Rc::clone(&sink),
        follower: Rc::clone(&follower),
        until_exhausted: !args.tail,
        shown: false,
    }
    .tick();

    main_loop.run();

    follower.stop();
    sink.detach();
    Ok(())
}

/// Periodic task: report progress and decide when the loop is done.
struct Watch<E: 'static> {
    host: LoopHandle,
    progress: Receiver<Progress>,
    sink: Rc<QueueSink<E, LoopHandle>>,
    follower: Rc<Follower>,
    until_exhausted: bool,
    /// Whether a progress line is on stderr and needs ending.
    shown: bool,
}

impl<E: 'static> Watch<E> {
    fn tick(mut self) {
        for p in self.progress.try_iter() {
            eprint!("\r{}: {:>3.0}%", p.label, p.fraction * 100.0);
            self.shown = true;
        }
        let _ = std::io::stderr().flush();

        let finished =
            !self.follower.is_running() || (self.until_exhausted && self.follower.is_exhausted());
        if finished && self.sink.queue().is_empty() {
            if self.shown {
                eprintln!();
            }
            debug!(path = %self.follower.path().display(), "follow finished");
            self.host.quit();
            return;
        }

        let host = self.host.clone();
        host.timeout_add(WATCH_INTERVAL, Box::new(move || self.tick()));
    }
}

/// Trigger `interrupt` on Ctrl-C, from a helper thread running a small
/// tokio runtime.
fn spawn_ctrl_c(interrupt: Interrupt) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("cannot start signal runtime")?;

    thread::Builder::new()
        .name("ctrl-c".into())
        .spawn(move || {
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    debug!("received Ctrl-C");
                    interrupt.trigger();
                }
            });
        })
        .context("cannot spawn signal thread")?;
    Ok(())
}
