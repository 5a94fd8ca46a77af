// Licenced under the GNU General Public Licence, v3.  Please refer to the file "COPYING" for details.

#[macro_use(lazy_static)]
extern crate lazy_static;

pub mod util;
pub mod assets;
pub mod sim;
