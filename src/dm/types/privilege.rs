/*
 *
 *    Copyright (c) 2020-2022 Project CHIP Authors
 *
 *    Licensed under the Apache License, Version 2.0 (the "License");
 *    you may not use this file except in compliance with the License.
 *    You may obtain a copy of the License at
 *
 *        http://www.apache.org/licenses/LICENSE-2.0
 *
 *    Unless required by applicable law or agreed to in writing, software
 *    distributed under the License is distributed on an "AS IS" BASIS,
 *    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *    See the License for the specific language governing permissions and
 *    limitations under the License.
 */

use bitflags::bitflags;

bitflags! {
    /// Access flags of an attribute or a command.
    ///
    /// The `NEED_*` bits are the privilege an accessor must hold. They are carried as metadata only,
    /// authorization happens ahead of dispatch.
    #[repr(transparent)]
    #[derive(Default, Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct Access: u16 {
        const NEED_VIEW = 0x0001;
        const NEED_OPERATE = 0x0002;
        const NEED_MANAGE = 0x0004;
        const NEED_ADMIN = 0x0008;

        const READ = 0x0010;
        const WRITE = 0x0020;
        const FAB_SCOPED = 0x0040;
        const FAB_SENSITIVE = 0x0080;
        const TIMED_ONLY = 0x0100;

        const RV = Self::READ.bits() | Self::NEED_VIEW.bits();
        const RA = Self::READ.bits() | Self::NEED_ADMIN.bits();
        const RWVO = Self::READ.bits() | Self::WRITE.bits() | Self::NEED_VIEW.bits() | Self::NEED_OPERATE.bits();
        const RWVM = Self::READ.bits() | Self::WRITE.bits() | Self::NEED_VIEW.bits() | Self::NEED_MANAGE.bits();
        const RWVA = Self::READ.bits() | Self::WRITE.bits() | Self::NEED_VIEW.bits() | Self::NEED_ADMIN.bits();

        const WO = Self::WRITE.bits() | Self::NEED_OPERATE.bits();
        const WM = Self::WRITE.bits() | Self::NEED_MANAGE.bits();
        const WA = Self::WRITE.bits() | Self::NEED_ADMIN.bits();
    }
}

impl Access {
    pub const fn is_readable(&self) -> bool {
        self.contains(Self::READ)
    }

    pub const fn is_writable(&self) -> bool {
        self.contains(Self::WRITE)
    }
}

bitflags! {
    #[repr(transparent)]
    #[derive(Default, Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct Quality: u8 {
        const NONE = 0x00;
        const SCENE = 0x01;      // Short: S
        const PERSISTENT = 0x02; // Short: N
        const FIXED = 0x04;      // Short: F
        const NULLABLE = 0x08;   // Short: X
        const OPTIONAL = 0x10;   // Short: O

        const SN = Self::SCENE.bits() | Self::PERSISTENT.bits();
        const N = Self::PERSISTENT.bits();
        const F = Self::FIXED.bits();
        const X = Self::NULLABLE.bits();
        const NX = Self::PERSISTENT.bits() | Self::NULLABLE.bits();
    }
}

bitflags! {
    /// Capability flags reported for a cluster instance on an endpoint.
    #[repr(transparent)]
    #[derive(Default, Debug, Copy, Clone, Eq, PartialEq, Hash)]
    pub struct ClusterFlags: u8 {
        const SERVER = 0x01;
        const CLIENT = 0x02;
        const DIAGNOSTICS = 0x04;
    }
}
