// Interrupt handling.
//
// The converter is synchronous, so a small single-threaded runtime on a watcher
// thread waits for Ctrl-C. The first interrupt raises a stop flag that the driver
// checks between lines; it then closes the open table file and returns normally.
// If the driver is stuck in a read and does not stop within STOP_GRACE, or a
// second interrupt arrives, the watcher ends the process with status 0 itself.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

const STOP_GRACE: Duration = Duration::from_secs(5);

// Spawn the watcher thread and return the flag it raises. If the runtime or the
// handler cannot be set up the default SIGINT behavior stays in place and the
// flag is never raised.
pub fn watch_interrupt() -> Arc<AtomicBool> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    let spawned = thread::Builder::new()
        .name("signal-watcher".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_io()
                .enable_time()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    warn!("cannot start the signal watcher: {}", e);
                    return;
                }
            };
            runtime.block_on(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("cannot listen for Ctrl-C: {}", e);
                    return;
                }
                info!(message = "Signal received.", signal = "SIGINT");
                flag.store(true, Ordering::SeqCst);

                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!(message = "Signal received again.", signal = "SIGINT");
                    }
                    _ = tokio::time::sleep(STOP_GRACE) => {
                        warn!("converter did not stop within {:?}", STOP_GRACE);
                    }
                }
                std::process::exit(0);
            });
        });
    if let Err(e) = spawned {
        warn!("cannot spawn the signal watcher: {}", e);
    }
    stop
}
