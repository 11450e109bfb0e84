//! Length-checking and chunking shorthand shared by the field calcs.

/// Return `Err("Length mismatch")` from the enclosing function unless every
/// listed slice has length `n`.
macro_rules! check_length {
    ($n:expr, $($x:expr),+ $(,)?) => {
        $(
            if $x.len() != $n {
                return Err("Length mismatch");
            }
        )+
    };
}

/// [`check_length`] for each member of an (x, y, z) tuple of slices.
macro_rules! check_length_3tup {
    ($n:expr, $x:expr) => {
        $crate::macros::check_length!($n, $x.0, $x.1, $x.2)
    };
}

/// Split an (x, y, z) tuple of slices into parallel chunks of size `n`.
macro_rules! par_chunks_3tup {
    ($x:expr, $n:expr) => {
        (
            $x.0.par_chunks($n),
            $x.1.par_chunks($n),
            $x.2.par_chunks($n),
        )
    };
}

/// Split an (x, y, z) tuple of mutable slices into parallel chunks of size `n`.
macro_rules! mut_par_chunks_3tup {
    ($x:expr, $n:expr) => {
        (
            $x.0.par_chunks_mut($n),
            $x.1.par_chunks_mut($n),
            $x.2.par_chunks_mut($n),
        )
    };
}

pub(crate) use check_length;
pub(crate) use check_length_3tup;
pub(crate) use mut_par_chunks_3tup;
pub(crate) use par_chunks_3tup;
