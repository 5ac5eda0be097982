use distinct_counter::{threshold, DistinctCounter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let stream_len = 1_000_000;
    let thresh = threshold(0.05, 0.01, stream_len)?;
    println!("threshold = {}", thresh);

    let mut counter = DistinctCounter::<usize>::with_threshold(thresh)?;
    for i in 0..stream_len {
        counter.insert(i % 400_000)?;
    }
    println!("counter = {:?}", counter);
    println!("estimate = {} (actual 400000)", counter.estimate());

    // a threshold far below the stream cardinality trips the counter
    let mut tiny = DistinctCounter::<usize>::with_threshold(1)?;
    match tiny.insert_all(0..stream_len) {
        Ok(()) => println!("tiny estimate = {}", tiny.estimate()),
        Err(err) => println!("tiny counter failed: {}", err),
    }

    Ok(())
}
