//! Crate-level round trip for the precomputed-grid resource format, written
//! to and read back from an actual file on disk (the in-process byte-buffer
//! round trip lives alongside the decoder itself).

use patchstore::external::grid_resource::DataGridLayer;

/// Build a 3x3x3 grid with a single non-zero value at (x=0, y=1, t=2),
/// write it to disk, reopen it, and confirm the one populated cell and the
/// units string both survive the trip bit-for-bit while every other cell
/// reads back as zero.
#[test]
fn precomputed_grid_round_trips_through_a_file() {
    let mut values = vec![0.0_f64; 27];
    // x=0,y=1,t=2 -> index (x*3+y)*3+t = (0*3+1)*3+2 = 5
    values[5] = 5.0;
    let layer = DataGridLayer::new(0, 2, 0, 2, 0, 2, "celsius".to_string(), values).unwrap();

    let file = tempfile::NamedTempFile::with_suffix(".jshd").unwrap();
    std::fs::write(file.path(), layer.encode()).unwrap();

    let bytes = std::fs::read(file.path()).unwrap();
    let decoded = DataGridLayer::decode(file.path(), &bytes).unwrap();

    assert_eq!(decoded.units, "celsius");
    assert_eq!(decoded.value_at(0, 1, 2), Some(5.0));

    for x in 0..3 {
        for y in 0..3 {
            for t in 0..3 {
                if (x, y, t) == (0, 1, 2) {
                    continue;
                }
                assert_eq!(decoded.value_at(x, y, t), Some(0.0));
            }
        }
    }
}
