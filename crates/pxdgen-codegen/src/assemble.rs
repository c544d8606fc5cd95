//! Artifact assembly
//!
//! Puts together the disclaimer, the original license block, the macro
//! declarations and the structural translation of one header.

use chrono::{DateTime, Local, Utc};

/// Appended after the disclaimer of every full artifact
const MODIFICATION_NOTICE: &str = "\
#
# Copyright (C) 2023 PySlurm Developers (Modifications as described above)
#
# This file is part of PySlurm
#
# PySlurm is free software; you can redistribute it and/or modify
# it under the terms of the GNU General Public License as published by
# the Free Software Foundation; either version 2 of the License, or
# (at your option) any later version.
#
# PySlurm is distributed in the hope that it will be useful,
# but WITHOUT ANY WARRANTY; without even the implied warranty of
# MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
# GNU General Public License for more details.
#
# You should have received a copy of the GNU General Public License along
# with PySlurm; if not, write to the Free Software Foundation, Inc.,
# 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Generation timestamp, pinned to `source_date_epoch` when given
pub fn timestamp(source_date_epoch: Option<i64>) -> String {
    match source_date_epoch.and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)) {
        Some(pinned) => pinned.format(TIMESTAMP_FORMAT).to_string(),
        None => Local::now().format(TIMESTAMP_FORMAT).to_string(),
    }
}

/// Header comment of a generated file, embedding the license block
pub fn disclaimer(header: &str, timestamp: &str, provenance: &str) -> String {
    format!(
        "\
##############################################################################
# NOTICE: This File has been generated by pxdgen, which translates the
# {header} C-Header file into Cython compatible definitions. Basically, this
# can be seen as a modified version of the original header, with the
# following changes:
#
# * have the correct cython syntax for type definitions, e.g. \"typedef struct
# <name>\" is converted to \"ctypedef struct <name>\"
# * C-Macros are listed with their appropriate uint type
# * Any definitions that cannot be translated are not included in this file
#
# Generated on {timestamp}
#
# The Original Copyright notice from {header} has been included
# below:
#
{provenance}#
# Slurm is licensed under the GNU GPLv2. For the full text of Slurm's License,
# please see here: pyslurm/slurm/SLURM_LICENSE
#
# Please, as mentioned above, also have a look at Slurm's DISCLAIMER under
# pyslurm/slurm/SLURM_DISCLAIMER
##############################################################################
"
    )
}

/// Parts of a full artifact
#[derive(Debug, Clone, Copy)]
pub struct Sections<'a> {
    pub header: &'a str,
    pub timestamp: &'a str,
    pub provenance: &'a str,
    /// Rendered macro block, empty if no macro resolved
    pub macros: &'a str,
    /// Structural translation, already keyword-rewritten
    pub structural: &'a str,
}

/// Concatenate the sections of a full artifact
pub fn assemble(sections: &Sections<'_>) -> String {
    let mut out = disclaimer(sections.header, sections.timestamp, sections.provenance);
    out.push_str(MODIFICATION_NOTICE);
    out.push_str(sections.macros);
    out.push('\n');
    out.push_str(sections.structural);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pinned_timestamp() {
        assert_eq!(timestamp(Some(0)), "1970-01-01T00:00:00.000000");
        assert_eq!(timestamp(Some(1_700_000_000)), "2023-11-14T22:13:20.000000");
    }

    #[test]
    fn test_disclaimer_embeds_provenance() {
        let text = disclaimer("slurm.h", "T", "#  Copyright (C) SchedMD LLC.\n");

        assert!(text.contains("# NOTICE: This File has been generated by pxdgen"));
        assert!(text.contains("# Generated on T\n"));
        assert!(text.contains(
            "# below:\n#\n#  Copyright (C) SchedMD LLC.\n#\n# Slurm is licensed"
        ));
        assert!(text.lines().all(|l| l.starts_with('#')));
    }

    #[test]
    fn test_assemble_order() {
        let text = assemble(&Sections {
            header: "slurm.h",
            timestamp: "T",
            provenance: "",
            macros: "cdef extern from \"slurm/slurm.h\":\n\n    uint8_t A\n",
            structural: "cdef extern from \"slurm/slurm.h\":\n\n    pass\n",
        });

        let notice = text.find("Modifications as described above").unwrap();
        let macros = text.find("    uint8_t A\n").unwrap();
        let structural = text.find("    pass\n").unwrap();
        assert!(notice < macros && macros < structural);
        assert!(text.contains("    uint8_t A\n\ncdef extern from"));
    }

    #[test]
    fn test_assemble_without_macros() {
        let text = assemble(&Sections {
            header: "slurm_errno.h",
            timestamp: "T",
            provenance: "",
            macros: "",
            structural: "STRUCTURAL\n",
        });
        assert!(text.ends_with("USA.\n\n\nSTRUCTURAL\n"));
    }
}
