use std::sync::Arc;

use pagepool::buffer::BufferPoolManager;
use pagepool::storage::disk::DiskManager;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("pagepool - buffer pool page cache demo");
    println!("======================================\n");

    let db_path = "demo.db";

    let disk_manager = Arc::new(DiskManager::new(db_path).expect("failed to open database file"));
    println!("Opened database file: {}", db_path);

    // Tiny pool so the demo actually evicts.
    let bpm = BufferPoolManager::new(3, 2, Arc::clone(&disk_manager));
    println!(
        "Created buffer pool with {} frames (LRU-2)\n",
        bpm.pool_size()
    );

    // Allocate a page and scribble on it.
    let (first_id, page) = bpm
        .new_page()
        .expect("disk error")
        .expect("no frame available");
    let greeting = b"Hello from the page cache!";
    page.write_data()[..greeting.len()].copy_from_slice(greeting);
    bpm.unpin_page(first_id, true);
    println!("Wrote {} bytes into {}", greeting.len(), first_id);

    // Churn enough pages through the pool to push the first one out.
    for _ in 0..4 {
        let (page_id, _page) = bpm
            .new_page()
            .expect("disk error")
            .expect("no frame available");
        bpm.unpin_page(page_id, false);
    }
    println!("Churned 4 more pages through a 3-frame pool");

    // The first page comes back from disk, contents intact.
    let page = bpm
        .fetch_page(first_id)
        .expect("disk error")
        .expect("no frame available");
    {
        let data = page.read_data();
        println!(
            "Fetched {} again: {:?}",
            first_id,
            String::from_utf8_lossy(&data[..greeting.len()])
        );
    }
    bpm.unpin_page(first_id, false);

    println!(
        "\nDisk traffic: {} reads, {} writes",
        disk_manager.get_num_reads(),
        disk_manager.get_num_writes()
    );

    std::fs::remove_file(db_path).ok();
    println!("Demo completed successfully!");
}
