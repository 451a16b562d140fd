use mimalloc::MiMalloc;

// Thousands of sensor threads allocate concurrently
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
