// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.


pub use crate::mpls::errors as mpls_errors;
pub use crate::subtitle::ass::errors as ass_errors;
pub use crate::subtitle::srt::errors as srt_errors;

// see https://docs.rs/error-chain/0.10.0/error_chain/
#[cfg_attr(rustfmt, rustfmt_skip)]
error_chain! {
    foreign_links {
        Io(::std::io::Error)
        /// Reading or writing a file failed.
        ;

        FromUtf8Error(::std::string::FromUtf8Error)
        /// Converting byte-stream to string failed.
        ;
    }


    links {
        MplsError(mpls_errors::Error, mpls_errors::ErrorKind)
        /// Parsing an `.mpls` playlist failed.
        ;

        AssError(ass_errors::Error, ass_errors::ErrorKind)
        /// Parsing a `.ssa`/`.ass` file failed.
        ;

        SrtError(srt_errors::Error, srt_errors::ErrorKind)
        /// Parsing a `.srt` file failed.
        ;
    }

    errors {
        /// The file format is not supported by this library.
        UnknownFileFormat {
            description("unknown file format, only SubRip (.srt), SubStationAlpha (.ssa/.ass) and PGS (.sup) are supported at the moment")
        }

        /// A `.sup`/PGS segment stream ended mid-segment or had a bad magic byte.
        PgsParseError(msg: String) {
            description("malformed PGS segment stream")
            display("malformed PGS segment stream: {}", msg)
        }

        /// An `.m2ts` transport stream had no recoverable PCR.
        M2tsParseError(msg: String) {
            description("malformed M2TS stream")
            display("malformed M2TS stream: {}", msg)
        }

        /// Trying to merge two subtitles of different formats (e.g. ASS into SRT).
        VariantMismatch {
            description("cannot merge subtitles of different formats")
        }

        /// No placement could be found that satisfies the ordering/gap invariants.
        AlignmentError(msg: String) {
            description("could not align episodes to chapters")
            display("could not align episodes to chapters: {}", msg)
        }

        /// An external tool binary was missing or returned a non-zero exit status.
        ToolError(tool: String, status: String, stderr: String) {
            description("external tool invocation failed")
            display("external tool `{}` failed ({}):\n{}", tool, status, stderr)
        }

        /// A caller-supplied cancellation signal fired between tool invocations.
        Cancelled {
            description("operation was cancelled")
        }
    }
}
