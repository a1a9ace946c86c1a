use std::sync::Arc;

use jdgen_stream::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), StreamError> {
    let client = Arc::new(StreamClient::from_env()?);
    let generation = Generation::new(client, Arc::new(LogNotifier));

    generation.start(GenerateRequest::new("c0001", "backend"));
    generation.join().await;

    match generation.phase() {
        GenPhase::Done => println!("{}", generation.content()),
        phase => eprintln!("generation ended in {phase:?}"),
    }
    Ok(())
}
