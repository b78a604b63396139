pub mod combined;
pub mod nonstandard;

pub mod phase0 {
    pub mod consts;
    pub mod primitives;
}

pub mod bellatrix {
    pub mod containers;
    pub mod primitives;
}

pub mod capella {
    pub mod containers;
}

pub mod unphased {
    pub mod containers;
}

mod bytes;
mod uint256;
