use jdgen_stream::StreamOpener as _;
use jdgen_stream::prelude::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), StreamError> {
    let client = StreamClient::from_env()?;

    let mut stream = client
        .open(&GenerateRequest::new("c0001", "backend"))
        .await?;

    while let Some(event) = stream.next_event().await {
        match event {
            StreamEvent::Started(payload) => {
                eprintln!("request accepted: {}", payload.request_id);
            }
            StreamEvent::Delta { text, .. } => print!("{text}"),
            StreamEvent::Completed(payload) => {
                println!();
                eprintln!("done: {}", payload.title.as_deref().unwrap_or("(untitled)"));
            }
            StreamEvent::Failed(failure) => eprintln!("stream failed: {failure}"),
        }
    }
    Ok(())
}
