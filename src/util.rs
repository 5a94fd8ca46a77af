// Licenced under the GNU General Public Licence, v3.  Please refer to the file "COPYING" for details.

// General utilities

pub const LOGGING : bool = false;
pub const WARNING : bool = true;
pub const CARGO_TEST : bool = cfg!(test);

#[macro_export]
macro_rules! ptrace {
    ($($a:tt)*) => {
	if $crate::util::LOGGING {
	    if $crate::util::CARGO_TEST {
		println!($($a)*)
	    } else {
		trace!($($a)*)
	    }
	}
    }
}

#[macro_export]
macro_rules! pdebug {
    ($($a:tt)*) => {
	if $crate::util::LOGGING {
	    if $crate::util::CARGO_TEST {
		println!($($a)*)
	    } else {
		debug!($($a)*)
	    }
	}
    }
}

#[macro_export]
macro_rules! pinfo {
    ($($a:tt)*) => {
	if $crate::util::LOGGING {
	    if $crate::util::CARGO_TEST {
		println!($($a)*)
	    } else {
		info!($($a)*)
	    }
	}
    }
}

#[macro_export]
macro_rules! pwarn {
    ($($a:tt)*) => {
	if $crate::util::WARNING {
	    if $crate::util::CARGO_TEST {
		println!($($a)*)
	    } else {
		warn!($($a)*)
	    }
	}
    }
}

#[macro_export]
macro_rules! perror {
    ($($a:tt)*) => {
	if $crate::util::CARGO_TEST {
	    println!($($a)*)
	} else {
	    error!($($a)*)
	}
    }
}
