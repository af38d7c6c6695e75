#[derive(Debug, Default)]
pub struct Stats {
    pub frames: usize,
    pub updates: usize,
    pub delays: usize,
    pub lib_writes: usize,
    pub map_writes: usize,
    pub bytes: usize,
}
